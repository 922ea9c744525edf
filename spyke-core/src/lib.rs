//! # spyke-core
//!
//! Foundation crate for spike-sorting curation.
//! Defines the unit/channel data model, collaborator traits, errors,
//! config, tracing setup, and tunable constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;
pub mod tracing;

// Re-export the most commonly used types at the crate root.
pub use config::{CurationConfig, SpykeConfig};
pub use errors::{CurationError, CurationResult, SortingError};
pub use models::{Channel, ChannelGroup, Label, QualityMetrics, Unit, UnitId, UnitTable};
pub use traits::{ISortingMutator, ISortingSource};
