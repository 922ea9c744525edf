//! Amplitude pre-filter: drop artifact spikes before any analysis.

use spyke_core::errors::{CurationError, CurationResult};
use spyke_core::models::UnitId;
use spyke_core::traits::{ISortingMutator, ISortingSource};
use tracing::debug;

/// Split the spikes of `unit_id` whose peak amplitude exceeds `threshold`
/// into a throwaway unit and delete it. The unit keeps its id.
///
/// Returns the number of spikes removed.
pub fn remove_amplitude_artifacts<S>(sorting: &mut S, unit_id: UnitId, threshold: f64) -> CurationResult<usize>
where
    S: ISortingSource + ISortingMutator + ?Sized,
{
    let amplitudes = sorting.get_spike_amplitudes(unit_id)?;
    let index_vector: Vec<usize> = amplitudes
        .iter()
        .map(|a| usize::from(a.abs() > threshold))
        .collect();
    let artifacts = index_vector.iter().filter(|&&g| g == 1).count();
    if artifacts == 0 {
        return Ok(0);
    }
    if artifacts == amplitudes.len() {
        debug!(unit_id, spikes = artifacts, "every spike is an artifact");
    }

    let Some(artifact_id) = sorting.allocate_unit_ids(1).first().copied() else {
        return Err(CurationError::InvalidUnit {
            unit_id,
            reason: "no unit id available for artifacts".to_string(),
        });
    };
    sorting.split(unit_id, &index_vector, &[unit_id, artifact_id])?;
    sorting.remove_unit(artifact_id)?;

    debug!(unit_id, spikes = artifacts, threshold, "amplitude artifacts removed");
    Ok(artifacts)
}

/// Run the pre-filter over every unit of the sorting.
pub fn filter_all<S>(sorting: &mut S, threshold: f64) -> CurationResult<usize>
where
    S: ISortingSource + ISortingMutator + ?Sized,
{
    let mut removed = 0;
    for unit_id in sorting.unit_ids() {
        removed += remove_amplitude_artifacts(sorting, unit_id, threshold)?;
    }
    Ok(removed)
}
