//! Configuration system.
//! TOML-based, layered resolution: CLI > env > project > defaults.

pub mod curation_config;
pub mod defaults;
pub mod persistence_config;
pub mod spyke_config;

pub use curation_config::CurationConfig;
pub use persistence_config::PersistenceConfig;
pub use spyke_config::{CliOverrides, SpykeConfig};
