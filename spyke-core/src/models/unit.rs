//! Unit record: one putative neuron in the sorting.

use serde::{Deserialize, Serialize};

use super::{ChannelGroup, Label, UnitId};

/// A unit of the sorting together with its curation verdict.
///
/// `remove` and `split` hold indices into the unit's spike train.
/// `split` is indexed by recursion depth; after aggregation its levels,
/// `remove`, and the kept spikes partition the spike train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub spike_count: usize,
    /// Channel id with the largest template amplitude.
    pub main_ch: usize,
    pub group: u32,
    pub probe: u32,
    /// Parent unit this one was split from.
    #[serde(default)]
    pub mother: Option<UnitId>,
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(default)]
    pub remove: Vec<usize>,
    #[serde(default)]
    pub split: Vec<Vec<usize>>,
    /// Dominant peak sample index across the unit's channels.
    #[serde(default)]
    pub center: Option<usize>,
}

impl Unit {
    pub fn new(id: UnitId, spike_count: usize, main_ch: usize, group: ChannelGroup) -> Self {
        Self {
            id,
            spike_count,
            main_ch,
            group: group.shank,
            probe: group.probe,
            mother: None,
            label: None,
            remove: Vec::new(),
            split: Vec::new(),
            center: None,
        }
    }

    /// A child unit produced by splitting `self`.
    pub fn child(&self, id: UnitId, spike_count: usize, label: Label) -> Self {
        Self {
            id,
            spike_count,
            main_ch: self.main_ch,
            group: self.group,
            probe: self.probe,
            mother: Some(self.id),
            label: Some(label),
            remove: Vec::new(),
            split: Vec::new(),
            center: self.center,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn channel_group(&self) -> ChannelGroup {
        ChannelGroup::new(self.probe, self.group)
    }

    pub fn is_labeled(&self, label: Label) -> bool {
        self.label == Some(label)
    }

    /// Number of spikes assigned to any split level.
    pub fn split_spike_count(&self) -> usize {
        self.split.iter().map(Vec::len).sum()
    }

    /// Number of spikes that stay in the unit's core.
    pub fn kept_spike_count(&self) -> usize {
        self.spike_count
            .saturating_sub(self.remove.len() + self.split_spike_count())
    }
}
