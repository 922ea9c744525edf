//! Trash reassignment: hand trash spikes back to the units they fit.
//!
//! Every spike of a trash unit is correlated, on each candidate's main
//! channel, with that candidate's template. The best candidate above the
//! correlation threshold receives it through one split of the trash unit
//! and one merge per destination.

use std::collections::BTreeMap;

use spyke_core::errors::{CurationError, CurationResult, SortingError};
use spyke_core::models::{ChannelGroup, Label, Unit, UnitId, UnitTable};
use spyke_core::traits::{ISortingMutator, ISortingSource};
use tracing::{debug, info};

use crate::analyzer::correlation::{peak_index, windowed_correlations};

/// Result of one group's reassignment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassignment {
    pub spikes_reassigned: usize,
    /// Trash units emptied and deleted.
    pub trash_units_removed: usize,
    /// The single trash unit left in the group, if any.
    pub residual_trash: Option<UnitId>,
}

/// Pick the destination for one spike.
///
/// The highest score wins if it is strictly above `threshold`; equal
/// scores resolve to the lowest unit id. NaN scores never win.
pub fn choose_destination(scores: &[(UnitId, f64)], threshold: f64) -> Option<UnitId> {
    scores
        .iter()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(UnitId, f64)>, &(id, score)| match best {
            Some((best_id, best_score))
                if best_score > score || (best_score == score && best_id < id) =>
            {
                best
            }
            _ => Some((id, score)),
        })
        .filter(|&(_, score)| score > threshold)
        .map(|(id, _)| id)
}

/// A non-trash unit that may receive trash spikes.
struct Candidate {
    id: UnitId,
    channel: usize,
    template: Vec<f64>,
    center: usize,
}

fn candidates<S>(sorting: &S, units: &UnitTable, group: ChannelGroup) -> CurationResult<Vec<Candidate>>
where
    S: ISortingSource + ?Sized,
{
    units
        .iter()
        .filter(|u| u.channel_group() == group && !u.is_labeled(Label::Trash))
        .map(|u| {
            let template = sorting.get_template(u.id, u.main_ch)?;
            let center = u.center.or_else(|| peak_index(&template)).unwrap_or(0);
            Ok(Candidate {
                id: u.id,
                channel: u.main_ch,
                template,
                center,
            })
        })
        .collect()
}

/// Reassign the trash spikes of `group`, then fold what is left into one
/// trash unit.
pub fn reassign_group<S>(
    sorting: &mut S,
    units: &mut UnitTable,
    group: ChannelGroup,
    correlation_threshold: f64,
) -> CurationResult<Reassignment>
where
    S: ISortingSource + ISortingMutator + ?Sized,
{
    let mut outcome = Reassignment::default();
    let trash_ids = units.ids_with_label(group, Label::Trash);
    if trash_ids.is_empty() {
        return Ok(outcome);
    }

    let candidates = candidates(sorting, units, group)?;
    let mut remaining = Vec::new();

    for trash_id in trash_ids {
        let destinations = score_trash_unit(sorting, trash_id, &candidates, correlation_threshold)?;
        let moved = move_spikes(sorting, units, trash_id, &destinations)?;
        outcome.spikes_reassigned += moved;

        if units.contains(trash_id) {
            remaining.push(trash_id);
        } else {
            outcome.trash_units_removed += 1;
        }
    }

    outcome.residual_trash = merge_residual_trash(sorting, units, &remaining)?;
    info!(
        group = %group,
        reassigned = outcome.spikes_reassigned,
        emptied = outcome.trash_units_removed,
        residual = ?outcome.residual_trash,
        "trash reassigned"
    );
    Ok(outcome)
}

/// Destination of every spike of `trash_id`, `None` when it stays trash.
fn score_trash_unit<S>(
    sorting: &S,
    trash_id: UnitId,
    candidates: &[Candidate],
    threshold: f64,
) -> CurationResult<Vec<Option<UnitId>>>
where
    S: ISortingSource + ?Sized,
{
    let waveforms = sorting.get_waveforms(trash_id)?;
    let n_spikes = waveforms.n_spikes();

    let per_candidate: Vec<Vec<f64>> = candidates
        .iter()
        .map(|c| {
            if c.channel >= waveforms.n_channels() {
                return Err(CurationError::Sorting(SortingError::UnknownChannel {
                    channel: c.channel,
                }));
            }
            let snippets = waveforms.channel_snippets(c.channel);
            Ok(windowed_correlations(&snippets, &c.template, c.center))
        })
        .collect::<CurationResult<_>>()?;

    Ok((0..n_spikes)
        .map(|spike| {
            let scores: Vec<(UnitId, f64)> = candidates
                .iter()
                .zip(&per_candidate)
                .map(|(c, r)| (c.id, r[spike]))
                .collect();
            choose_destination(&scores, threshold)
        })
        .collect())
}

/// Split `trash_id` by destination and merge each part into its unit.
/// Returns the number of spikes moved.
fn move_spikes<S>(
    sorting: &mut S,
    units: &mut UnitTable,
    trash_id: UnitId,
    destinations: &[Option<UnitId>],
) -> CurationResult<usize>
where
    S: ISortingMutator + ?Sized,
{
    // destination id -> (group index, spike count), groups ordered by id
    let mut targets: BTreeMap<UnitId, (usize, usize)> = BTreeMap::new();
    for dest in destinations.iter().flatten() {
        targets.entry(*dest).or_insert((0, 0)).1 += 1;
    }
    if targets.is_empty() {
        return Ok(0);
    }
    for (g, entry) in targets.values_mut().enumerate() {
        entry.0 = g + 1;
    }

    let index_vector: Vec<usize> = destinations
        .iter()
        .map(|d| d.and_then(|id| targets.get(&id)).map_or(0, |&(g, _)| g))
        .collect();

    let mut new_ids = vec![trash_id];
    new_ids.extend(sorting.allocate_unit_ids(targets.len()));
    if new_ids.len() != targets.len() + 1 {
        return Err(CurationError::InvalidUnit {
            unit_id: trash_id,
            reason: format!("requested {} unit ids, got {}", targets.len(), new_ids.len() - 1),
        });
    }
    let created = sorting.split(trash_id, &index_vector, &new_ids)?;

    let mut moved = 0;
    for (&dest, &(g, count)) in &targets {
        let part = new_ids[g];
        if !created.contains(&part) {
            continue;
        }
        sorting.merge(&[dest, part], dest)?;
        if let Some(unit) = units.get_mut(dest) {
            unit.spike_count += count;
        }
        moved += count;
        debug!(trash_id, dest, spikes = count, "trash spikes merged");
    }

    let kept = destinations.len() - moved;
    if created.contains(&trash_id) {
        if let Some(unit) = units.get_mut(trash_id) {
            unit.spike_count = kept;
        }
    } else {
        units.remove(trash_id);
        debug!(trash_id, "trash unit emptied");
    }
    Ok(moved)
}

/// Merge the trash units left in a group into one under a fresh id.
fn merge_residual_trash<S>(
    sorting: &mut S,
    units: &mut UnitTable,
    remaining: &[UnitId],
) -> CurationResult<Option<UnitId>>
where
    S: ISortingMutator + ?Sized,
{
    match remaining {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        [first, ..] => {
            let Some(fresh) = sorting.allocate_unit_ids(1).first().copied() else {
                return Err(CurationError::InvalidUnit {
                    unit_id: *first,
                    reason: "no unit id available for the residual trash".to_string(),
                });
            };
            sorting.merge(remaining, fresh)?;

            let parts: Vec<Unit> = remaining.iter().filter_map(|&id| units.remove(id)).collect();
            let total = parts.iter().map(|u| u.spike_count).sum();
            if let Some(head) = parts.first() {
                let mut residual = Unit::new(fresh, total, head.main_ch, head.channel_group())
                    .with_label(Label::Trash);
                residual.center = head.center;
                units.insert(residual);
            }
            debug!(merged = ?remaining, into = fresh, "residual trash merged");
            Ok(Some(fresh))
        }
    }
}
