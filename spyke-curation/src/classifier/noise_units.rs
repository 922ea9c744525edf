//! Population-level noise rule.
//!
//! A unit is noise if it is contaminated (violations per spike above the
//! FDR cut), or if it is time-restricted (low presence ratio) and either
//! fires faster than the time-restricted average or combines a low or
//! undefined amplitude cutoff with many violations.

use std::collections::BTreeSet;

use spyke_core::constants::{CLEAN_NOISE_VIOLATIONS, CONTAMINATION_FDR, TIME_RESTRICTED_PRESENCE};
use spyke_core::models::{MetricRow, UnitId};

/// Mean of the finite values, `NaN` when there are none.
fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Ids of the units flagged as noise.
pub fn find_noise_units(rows: &[MetricRow]) -> BTreeSet<UnitId> {
    let contaminated = rows
        .iter()
        .filter(|r| r.false_discovery_ratio() > CONTAMINATION_FDR)
        .map(|r| r.unit_id);

    let time_restricted: Vec<&MetricRow> = rows
        .iter()
        .filter(|r| r.presence_ratio < TIME_RESTRICTED_PRESENCE)
        .collect();

    let mean_rate = finite_mean(time_restricted.iter().map(|r| r.firing_rate));
    let specific = time_restricted
        .iter()
        .filter(|r| r.firing_rate > mean_rate)
        .map(|r| r.unit_id);

    let mean_cutoff = finite_mean(time_restricted.iter().map(|r| r.amplitude_cutoff));
    let clean_noise = time_restricted
        .iter()
        .filter(|r| r.amplitude_cutoff.is_nan() || r.amplitude_cutoff < mean_cutoff)
        .filter(|r| r.refractory_violation_count > CLEAN_NOISE_VIOLATIONS)
        .map(|r| r.unit_id);

    contaminated.chain(specific).chain(clean_noise).collect()
}
