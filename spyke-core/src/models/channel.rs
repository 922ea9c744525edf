//! Analysis-scoped channel verdict.

use serde::{Deserialize, Serialize};

use super::{Label, UnitId};

/// Verdict of the correlation analysis of one unit on one channel.
///
/// Lives only between analysis and aggregation; the back-reference to
/// the unit is explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: usize,
    pub owning_unit_id: UnitId,
    /// Dominant peak sample index of the unit's spikes on this channel.
    pub center: usize,
    pub label: Label,
    pub remove: Vec<usize>,
    pub split: Vec<Vec<usize>>,
    /// Histogram bin index used as the correlation cut.
    pub threshold: usize,
}

impl Channel {
    pub fn new(id: usize, owning_unit_id: UnitId, center: usize, label: Label) -> Self {
        Self {
            id,
            owning_unit_id,
            center,
            label,
            remove: Vec::new(),
            split: Vec::new(),
            threshold: 0,
        }
    }
}
