//! Errors reported by the external sorting collaborator.

use super::error_code::{self, SpykeErrorCode};
use crate::models::UnitId;

/// Failures of the sorting/analysis collaborator behind `ISortingSource`
/// and `ISortingMutator`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SortingError {
    #[error("unknown unit {unit_id}")]
    UnknownUnit { unit_id: UnitId },

    #[error("unknown channel {channel}")]
    UnknownChannel { channel: usize },

    #[error("waveforms unavailable for unit {unit_id}: {reason}")]
    WaveformUnavailable { unit_id: UnitId, reason: String },

    #[error("invalid split of unit {unit_id}: {reason}")]
    InvalidSplit { unit_id: UnitId, reason: String },

    #[error("invalid merge into unit {new_id}: {reason}")]
    InvalidMerge { new_id: UnitId, reason: String },
}

impl SpykeErrorCode for SortingError {
    fn error_code(&self) -> &'static str {
        error_code::SORTING_ERROR
    }
}
