//! Curation data model: units, analysis-scoped channels, labels, metrics.

pub mod channel;
pub mod group;
pub mod label;
pub mod metrics;
pub mod unit;
pub mod unit_table;
pub mod waveforms;

pub use channel::Channel;
pub use group::ChannelGroup;
pub use label::Label;
pub use metrics::{MetricRow, QualityMetrics};
pub use unit::Unit;
pub use unit_table::UnitTable;
pub use waveforms::{median_of_snippets, Waveforms};

/// Identifier of a unit in the external sorting.
pub type UnitId = u32;
