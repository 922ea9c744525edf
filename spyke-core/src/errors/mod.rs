//! Error handling.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod curation_error;
pub mod error_code;
pub mod sorting_error;

pub use config_error::ConfigError;
pub use curation_error::{CurationError, CurationResult};
pub use error_code::SpykeErrorCode;
pub use sorting_error::SortingError;
