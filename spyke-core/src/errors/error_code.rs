//! SpykeErrorCode trait for structured error reporting.

/// Structured error code shared by every error enum, so that callers
/// (exporters, GUIs, logs) can match on a stable string.
pub trait SpykeErrorCode {
    /// Returns the error code string (e.g., "MISSING_METRIC").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn display_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const MISSING_METRIC: &str = "MISSING_METRIC";
pub const AMBIGUOUS_DISTRIBUTION: &str = "AMBIGUOUS_DISTRIBUTION";
pub const SPIKE_ASSIGNMENT_CONFLICT: &str = "SPIKE_ASSIGNMENT_CONFLICT";
pub const SPIKE_INDEX_OUT_OF_RANGE: &str = "SPIKE_INDEX_OUT_OF_RANGE";
pub const UNIT_COUNT_MISMATCH: &str = "UNIT_COUNT_MISMATCH";
pub const INVALID_UNIT: &str = "INVALID_UNIT";
pub const ALREADY_RUNNING: &str = "ALREADY_RUNNING";
pub const PERSISTENCE_ERROR: &str = "PERSISTENCE_ERROR";
pub const SORTING_ERROR: &str = "SORTING_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
