//! Unit table persistence configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where analyzed and final unit tables are written.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Analysis results; reused instead of re-analyzing when the file exists.
    pub units_path: Option<PathBuf>,
    /// Final unit table after split, merge and reassignment.
    pub final_units_path: Option<PathBuf>,
}
