//! Curation errors.

use super::error_code::{self, SpykeErrorCode};
use super::{ConfigError, SortingError};
use crate::models::UnitId;

/// Errors that can occur while classifying, analyzing, or mutating units.
#[derive(Debug, thiserror::Error)]
pub enum CurationError {
    #[error("unit {unit_id} is missing quality metric `{metric}`")]
    MissingMetric { unit_id: UnitId, metric: &'static str },

    /// Internal to the analyzer; always recovered as a `raw` verdict.
    #[error("ambiguous correlation distribution on channel {channel}: {reason}")]
    AmbiguousDistribution { channel: usize, reason: String },

    #[error("unit {unit_id}: spike {spike} assigned to group {first} and group {second}")]
    SpikeAssignmentConflict {
        unit_id: UnitId,
        spike: usize,
        first: usize,
        second: usize,
    },

    #[error("unit {unit_id}: spike index {spike} out of range for {spike_count} spikes")]
    SpikeIndexOutOfRange {
        unit_id: UnitId,
        spike: usize,
        spike_count: usize,
    },

    #[error("unit count changed during analysis: expected {expected}, got {actual}")]
    UnitCountMismatch { expected: usize, actual: usize },

    #[error("invalid unit {unit_id}: {reason}")]
    InvalidUnit { unit_id: UnitId, reason: String },

    #[error("a curation run is already in progress")]
    AlreadyRunning,

    #[error("unit table persistence failed for {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Sorting error: {0}")]
    Sorting(#[from] SortingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience alias used across the curation crates.
pub type CurationResult<T> = Result<T, CurationError>;

impl CurationError {
    /// Whether this error aborts the whole run rather than a single group.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingMetric { .. }
                | Self::UnitCountMismatch { .. }
                | Self::AlreadyRunning
                | Self::Config(_)
        )
    }
}

impl SpykeErrorCode for CurationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingMetric { .. } => error_code::MISSING_METRIC,
            Self::AmbiguousDistribution { .. } => error_code::AMBIGUOUS_DISTRIBUTION,
            Self::SpikeAssignmentConflict { .. } => error_code::SPIKE_ASSIGNMENT_CONFLICT,
            Self::SpikeIndexOutOfRange { .. } => error_code::SPIKE_INDEX_OUT_OF_RANGE,
            Self::UnitCountMismatch { .. } => error_code::UNIT_COUNT_MISMATCH,
            Self::InvalidUnit { .. } => error_code::INVALID_UNIT,
            Self::AlreadyRunning => error_code::ALREADY_RUNNING,
            Self::Persistence { .. } => error_code::PERSISTENCE_ERROR,
            Self::Sorting(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}
