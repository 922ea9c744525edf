use crate::errors::SortingError;
use crate::models::{ChannelGroup, QualityMetrics, UnitId, Waveforms};

/// Read side of the sorting: spike trains, waveforms, templates, metrics.
///
/// Channel ids index the channel axis of `get_waveforms`. Implementations
/// are shared across the unit-analysis worker pool.
pub trait ISortingSource: Send + Sync {
    /// Current unit ids, ascending.
    fn unit_ids(&self) -> Vec<UnitId>;

    /// Recording channel ids, ascending.
    fn channel_ids(&self) -> Vec<usize>;

    fn get_spike_train(&self, unit_id: UnitId) -> Result<Vec<u64>, SortingError>;

    /// Snippets as spike × sample × channel.
    fn get_waveforms(&self, unit_id: UnitId) -> Result<Waveforms, SortingError>;

    /// Template of `unit_id` on `channel`; the per-sample median of its
    /// waveforms unless the collaborator stores templates.
    fn get_template(&self, unit_id: UnitId, channel: usize) -> Result<Vec<f64>, SortingError> {
        let waveforms = self.get_waveforms(unit_id)?;
        if channel >= waveforms.n_channels() {
            return Err(SortingError::UnknownChannel { channel });
        }
        Ok(waveforms.median_template(channel))
    }

    fn get_quality_metrics(&self, unit_id: UnitId) -> Result<QualityMetrics, SortingError>;

    fn get_channel_group(&self, channel: usize) -> Result<ChannelGroup, SortingError>;

    /// Peak absolute amplitude of every spike of `unit_id`.
    fn get_spike_amplitudes(&self, unit_id: UnitId) -> Result<Vec<f64>, SortingError> {
        Ok(self.get_waveforms(unit_id)?.peak_amplitudes())
    }
}

/// Write side of the sorting. Calls for one shank/probe group must not be
/// interleaved: id allocation and split/merge are stateful.
pub trait ISortingMutator {
    /// `n` ids not used by any current unit, ascending. Does not reserve them.
    fn allocate_unit_ids(&self, n: usize) -> Vec<UnitId>;

    /// Split `unit_id` by `index_vector` (one group index per spike).
    /// Group `g` becomes unit `new_ids[g]`; empty groups create no unit.
    /// A new id may equal `unit_id`. Returns the ids actually created.
    fn split(
        &mut self,
        unit_id: UnitId,
        index_vector: &[usize],
        new_ids: &[UnitId],
    ) -> Result<Vec<UnitId>, SortingError>;

    /// Merge `unit_ids` into `new_id`, which may be one of them.
    fn merge(&mut self, unit_ids: &[UnitId], new_id: UnitId) -> Result<(), SortingError>;

    fn remove_unit(&mut self, unit_id: UnitId) -> Result<(), SortingError>;
}
