//! Per-unit quality metrics as delivered by the sorting collaborator.

use serde::{Deserialize, Serialize};

use super::UnitId;
use crate::errors::{CurationError, CurationResult};

/// Quality metrics for one unit. A `None` field is a missing metric;
/// an undefined amplitude cutoff is carried as `Some(f64::NAN)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityMetrics {
    pub spike_count: Option<f64>,
    pub presence_ratio: Option<f64>,
    pub firing_rate: Option<f64>,
    pub amplitude_cutoff: Option<f64>,
    pub refractory_violation_count: Option<f64>,
}

/// Quality metrics with every required field present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRow {
    pub unit_id: UnitId,
    pub spike_count: f64,
    pub presence_ratio: f64,
    pub firing_rate: f64,
    pub amplitude_cutoff: f64,
    pub refractory_violation_count: f64,
}

impl QualityMetrics {
    /// Build a complete metric set.
    pub fn complete(
        spike_count: f64,
        presence_ratio: f64,
        firing_rate: f64,
        amplitude_cutoff: f64,
        refractory_violation_count: f64,
    ) -> Self {
        Self {
            spike_count: Some(spike_count),
            presence_ratio: Some(presence_ratio),
            firing_rate: Some(firing_rate),
            amplitude_cutoff: Some(amplitude_cutoff),
            refractory_violation_count: Some(refractory_violation_count),
        }
    }

    /// Check that all five metrics are present.
    pub fn require(&self, unit_id: UnitId) -> CurationResult<MetricRow> {
        fn field(unit_id: UnitId, value: Option<f64>, metric: &'static str) -> CurationResult<f64> {
            value.ok_or(CurationError::MissingMetric { unit_id, metric })
        }

        Ok(MetricRow {
            unit_id,
            spike_count: field(unit_id, self.spike_count, "spike_count")?,
            presence_ratio: field(unit_id, self.presence_ratio, "presence_ratio")?,
            firing_rate: field(unit_id, self.firing_rate, "firing_rate")?,
            amplitude_cutoff: field(unit_id, self.amplitude_cutoff, "amplitude_cutoff")?,
            refractory_violation_count: field(
                unit_id,
                self.refractory_violation_count,
                "refractory_violation_count",
            )?,
        })
    }
}

impl MetricRow {
    /// Refractory violations per spike.
    pub fn false_discovery_ratio(&self) -> f64 {
        if self.spike_count > 0.0 {
            self.refractory_violation_count / self.spike_count
        } else {
            f64::INFINITY
        }
    }
}
