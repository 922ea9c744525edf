//! In-memory implementation of the sorting collaborator.
//!
//! Templates are the per-sample median of a unit's current waveforms, so
//! they follow splits and merges the way a recomputed analyzer would.
//! Templates and amplitudes are served from the stored waveforms even for
//! units whose waveform fetch is marked unavailable.

use std::collections::{BTreeMap, BTreeSet};

use spyke_core::errors::SortingError;
use spyke_core::models::{ChannelGroup, QualityMetrics, UnitId, Waveforms};
use spyke_core::traits::{ISortingMutator, ISortingSource};

/// One unit held by the in-memory sorting.
#[derive(Debug, Clone)]
pub struct SortedUnit {
    pub spike_train: Vec<u64>,
    pub waveforms: Waveforms,
    pub metrics: QualityMetrics,
}

impl SortedUnit {
    /// Spike times `0, 1, 2, ...` for every waveform.
    pub fn new(waveforms: Waveforms, metrics: QualityMetrics) -> Self {
        let spike_train = (0..waveforms.n_spikes() as u64).collect();
        Self {
            spike_train,
            waveforms,
            metrics,
        }
    }
}

/// A mutation applied to the sorting, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Split {
        unit_id: UnitId,
        created: Vec<UnitId>,
    },
    Merge {
        unit_ids: Vec<UnitId>,
        new_id: UnitId,
    },
    Remove {
        unit_id: UnitId,
    },
}

/// Sorting backed by plain maps. Channel ids are indices into the
/// channel-group list and into every unit's waveform channel axis.
#[derive(Debug, Clone, Default)]
pub struct InMemorySorting {
    units: BTreeMap<UnitId, SortedUnit>,
    channel_groups: Vec<ChannelGroup>,
    mutations: Vec<Mutation>,
    unavailable: BTreeSet<UnitId>,
}

impl InMemorySorting {
    pub fn new(channel_groups: Vec<ChannelGroup>) -> Self {
        Self {
            units: BTreeMap::new(),
            channel_groups,
            mutations: Vec::new(),
            unavailable: BTreeSet::new(),
        }
    }

    pub fn with_unit(mut self, unit_id: UnitId, unit: SortedUnit) -> Self {
        self.units.insert(unit_id, unit);
        self
    }

    /// Make `get_waveforms` fail for `unit_id`.
    pub fn with_unavailable_waveforms(mut self, unit_id: UnitId) -> Self {
        self.unavailable.insert(unit_id);
        self
    }

    pub fn unit(&self, unit_id: UnitId) -> Option<&SortedUnit> {
        self.units.get(&unit_id)
    }

    pub fn spike_count(&self, unit_id: UnitId) -> Option<usize> {
        self.units.get(&unit_id).map(|u| u.spike_train.len())
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    fn unit_or_err(&self, unit_id: UnitId) -> Result<&SortedUnit, SortingError> {
        self.units
            .get(&unit_id)
            .ok_or(SortingError::UnknownUnit { unit_id })
    }
}

impl ISortingSource for InMemorySorting {
    fn unit_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    fn channel_ids(&self) -> Vec<usize> {
        (0..self.channel_groups.len()).collect()
    }

    fn get_spike_train(&self, unit_id: UnitId) -> Result<Vec<u64>, SortingError> {
        Ok(self.unit_or_err(unit_id)?.spike_train.clone())
    }

    fn get_waveforms(&self, unit_id: UnitId) -> Result<Waveforms, SortingError> {
        let unit = self.unit_or_err(unit_id)?;
        if self.unavailable.contains(&unit_id) {
            return Err(SortingError::WaveformUnavailable {
                unit_id,
                reason: "waveform store offline".to_string(),
            });
        }
        Ok(unit.waveforms.clone())
    }

    fn get_template(&self, unit_id: UnitId, channel: usize) -> Result<Vec<f64>, SortingError> {
        let waveforms = &self.unit_or_err(unit_id)?.waveforms;
        if channel >= waveforms.n_channels() {
            return Err(SortingError::UnknownChannel { channel });
        }
        Ok(waveforms.median_template(channel))
    }

    fn get_spike_amplitudes(&self, unit_id: UnitId) -> Result<Vec<f64>, SortingError> {
        Ok(self.unit_or_err(unit_id)?.waveforms.peak_amplitudes())
    }

    fn get_quality_metrics(&self, unit_id: UnitId) -> Result<QualityMetrics, SortingError> {
        Ok(self.unit_or_err(unit_id)?.metrics)
    }

    fn get_channel_group(&self, channel: usize) -> Result<ChannelGroup, SortingError> {
        self.channel_groups
            .get(channel)
            .copied()
            .ok_or(SortingError::UnknownChannel { channel })
    }
}

impl ISortingMutator for InMemorySorting {
    fn allocate_unit_ids(&self, n: usize) -> Vec<UnitId> {
        let next = self.units.keys().next_back().map_or(0, |id| id + 1);
        (next..next + n as UnitId).collect()
    }

    fn split(
        &mut self,
        unit_id: UnitId,
        index_vector: &[usize],
        new_ids: &[UnitId],
    ) -> Result<Vec<UnitId>, SortingError> {
        let parent = self.unit_or_err(unit_id)?;
        if index_vector.len() != parent.spike_train.len() {
            return Err(SortingError::InvalidSplit {
                unit_id,
                reason: format!(
                    "index vector has {} entries for {} spikes",
                    index_vector.len(),
                    parent.spike_train.len()
                ),
            });
        }
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (spike, &group) in index_vector.iter().enumerate() {
            if group >= new_ids.len() {
                return Err(SortingError::InvalidSplit {
                    unit_id,
                    reason: format!("group {group} has no new id"),
                });
            }
            groups.entry(group).or_default().push(spike);
        }
        for &group in groups.keys() {
            let id = new_ids[group];
            if id != unit_id && self.units.contains_key(&id) {
                return Err(SortingError::InvalidSplit {
                    unit_id,
                    reason: format!("new id {id} is already in use"),
                });
            }
        }

        let parent = self
            .units
            .remove(&unit_id)
            .ok_or(SortingError::UnknownUnit { unit_id })?;
        let mut created = Vec::with_capacity(groups.len());
        for (group, spikes) in groups {
            let id = new_ids[group];
            let child = SortedUnit {
                spike_train: spikes.iter().map(|&s| parent.spike_train[s]).collect(),
                waveforms: parent.waveforms.select(&spikes),
                metrics: QualityMetrics {
                    spike_count: Some(spikes.len() as f64),
                    ..parent.metrics
                },
            };
            self.units.insert(id, child);
            created.push(id);
        }
        self.mutations.push(Mutation::Split {
            unit_id,
            created: created.clone(),
        });
        Ok(created)
    }

    fn merge(&mut self, unit_ids: &[UnitId], new_id: UnitId) -> Result<(), SortingError> {
        if unit_ids.is_empty() {
            return Err(SortingError::InvalidMerge {
                new_id,
                reason: "nothing to merge".to_string(),
            });
        }
        if self.units.contains_key(&new_id) && !unit_ids.contains(&new_id) {
            return Err(SortingError::InvalidMerge {
                new_id,
                reason: "target id is held by a unit outside the merge".to_string(),
            });
        }
        for &id in unit_ids {
            self.unit_or_err(id)?;
        }

        let mut spikes: Vec<(u64, UnitId, usize)> = Vec::new();
        for &id in unit_ids {
            let unit = self.unit_or_err(id)?;
            spikes.extend(unit.spike_train.iter().enumerate().map(|(i, &t)| (t, id, i)));
        }
        spikes.sort_by_key(|&(t, _, _)| t);

        let first = self.unit_or_err(unit_ids[0])?;
        let metrics = first.metrics;
        let (n_samples, n_channels) = (first.waveforms.n_samples(), first.waveforms.n_channels());
        let mut data = Vec::with_capacity(spikes.len() * n_samples * n_channels);
        for &(_, id, i) in &spikes {
            let source = &self.unit_or_err(id)?.waveforms;
            if (source.n_samples(), source.n_channels()) != (n_samples, n_channels) {
                return Err(SortingError::InvalidMerge {
                    new_id,
                    reason: "waveform shapes differ".to_string(),
                });
            }
            for sample in 0..n_samples {
                for channel in 0..n_channels {
                    data.push(source.get(i, sample, channel));
                }
            }
        }
        let waveforms = Waveforms::from_flat(spikes.len(), n_samples, n_channels, data).ok_or(
            SortingError::InvalidMerge {
                new_id,
                reason: "merged waveform buffer has the wrong length".to_string(),
            },
        )?;

        for id in unit_ids {
            self.units.remove(id);
        }
        self.units.insert(
            new_id,
            SortedUnit {
                spike_train: spikes.iter().map(|&(t, _, _)| t).collect(),
                waveforms,
                metrics: QualityMetrics {
                    spike_count: Some(spikes.len() as f64),
                    ..metrics
                },
            },
        );
        self.mutations.push(Mutation::Merge {
            unit_ids: unit_ids.to_vec(),
            new_id,
        });
        Ok(())
    }

    fn remove_unit(&mut self, unit_id: UnitId) -> Result<(), SortingError> {
        self.units
            .remove(&unit_id)
            .ok_or(SortingError::UnknownUnit { unit_id })?;
        self.mutations.push(Mutation::Remove { unit_id });
        Ok(())
    }
}
