//! First-match-wins rules: clean, then raw, then noise.
//!
//! Clean: no refractory violations. Raw: too few spikes to analyze.
//! Noise: flagged by the population-level noise rule.

use std::collections::{BTreeMap, BTreeSet};

use spyke_core::constants::{CLEAN_VIOLATION_COUNT, MIN_ANALYZABLE_SPIKES};
use spyke_core::errors::CurationResult;
use spyke_core::models::{Label, MetricRow, QualityMetrics, UnitId};
use tracing::debug;

use super::noise_units::find_noise_units;

/// A metric rule and the label it assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObviousRule {
    NoViolations,
    TooFewSpikes,
    NoiseUnit,
}

impl ObviousRule {
    /// Rules in precedence order.
    pub const ALL: [ObviousRule; 3] = [
        ObviousRule::NoViolations,
        ObviousRule::TooFewSpikes,
        ObviousRule::NoiseUnit,
    ];

    pub fn label(self) -> Label {
        match self {
            ObviousRule::NoViolations => Label::Clean,
            ObviousRule::TooFewSpikes => Label::Raw,
            ObviousRule::NoiseUnit => Label::Noise,
        }
    }

    fn matches(self, row: &MetricRow, noise: &BTreeSet<UnitId>) -> bool {
        match self {
            ObviousRule::NoViolations => row.refractory_violation_count == CLEAN_VIOLATION_COUNT,
            ObviousRule::TooFewSpikes => row.spike_count < MIN_ANALYZABLE_SPIKES,
            ObviousRule::NoiseUnit => noise.contains(&row.unit_id),
        }
    }
}

/// Label every unit whose metrics settle its verdict; `None` sends the
/// unit on to correlation analysis.
///
/// Fails with `MissingMetric` if any unit lacks one of the five metrics.
pub fn classify_obvious_units(
    metrics: &[(UnitId, QualityMetrics)],
) -> CurationResult<BTreeMap<UnitId, Option<Label>>> {
    let rows = metrics
        .iter()
        .map(|(id, m)| m.require(*id))
        .collect::<CurationResult<Vec<MetricRow>>>()?;
    let noise = find_noise_units(&rows);

    let labels: BTreeMap<UnitId, Option<Label>> = rows
        .iter()
        .map(|row| {
            let rule = ObviousRule::ALL
                .into_iter()
                .find(|rule| rule.matches(row, &noise));
            (row.unit_id, rule.map(ObviousRule::label))
        })
        .collect();

    debug!(
        units = labels.len(),
        settled = labels.values().filter(|l| l.is_some()).count(),
        "metric classification"
    );
    Ok(labels)
}
