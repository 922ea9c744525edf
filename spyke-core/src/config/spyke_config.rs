//! Top-level configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{defaults, CurationConfig, PersistenceConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`SPYKE_*`)
/// 3. Project config (`spyke.toml` in the data root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SpykeConfig {
    pub curation: CurationConfig,
    pub persistence: PersistenceConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub recursive: Option<bool>,
    pub remove_noise_units: Option<bool>,
    pub bin_size: Option<f64>,
    pub correlation_threshold: Option<f64>,
}

impl SpykeConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(defaults::DEFAULT_PROJECT_CONFIG_FILENAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &SpykeConfig) -> Result<(), ConfigError> {
        let curation = &config.curation;
        if let Some(bin_size) = curation.bin_size {
            if !(bin_size > 0.0 && bin_size <= 2.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "curation.bin_size".to_string(),
                    message: "must be in (0.0, 2.0]".to_string(),
                });
            }
        }
        if let Some(threshold) = curation.distribution_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ValidationFailed {
                    field: "curation.distribution_threshold".to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(threshold) = curation.correlation_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ValidationFailed {
                    field: "curation.correlation_threshold".to_string(),
                    message: "must be between -1.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(amplitude) = curation.amplitude_threshold {
            if !(amplitude > 0.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "curation.amplitude_threshold".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut SpykeConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: SpykeConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it holds a value.
    fn merge(base: &mut SpykeConfig, other: &SpykeConfig) {
        let (b, o) = (&mut base.curation, &other.curation);
        if o.recursive.is_some() {
            b.recursive = o.recursive;
        }
        if o.remove_noise_units.is_some() {
            b.remove_noise_units = o.remove_noise_units;
        }
        if o.amplitude_threshold.is_some() {
            b.amplitude_threshold = o.amplitude_threshold;
        }
        if o.bin_size.is_some() {
            b.bin_size = o.bin_size;
        }
        if o.distribution_threshold.is_some() {
            b.distribution_threshold = o.distribution_threshold;
        }
        if o.correlation_threshold.is_some() {
            b.correlation_threshold = o.correlation_threshold;
        }
        if o.parallel.is_some() {
            b.parallel = o.parallel;
        }

        if other.persistence.units_path.is_some() {
            base.persistence.units_path = other.persistence.units_path.clone();
        }
        if other.persistence.final_units_path.is_some() {
            base.persistence.final_units_path = other.persistence.final_units_path.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `SPYKE_CURATION_RECURSIVE`, `SPYKE_CURATION_BIN_SIZE`, etc.
    fn apply_env_overrides(config: &mut SpykeConfig) {
        let curation = &mut config.curation;
        if let Some(v) = env_parse::<bool>("SPYKE_CURATION_RECURSIVE") {
            curation.recursive = Some(v);
        }
        if let Some(v) = env_parse::<bool>("SPYKE_CURATION_REMOVE_NOISE_UNITS") {
            curation.remove_noise_units = Some(v);
        }
        if let Some(v) = env_parse::<f64>("SPYKE_CURATION_AMPLITUDE_THRESHOLD") {
            curation.amplitude_threshold = Some(v);
        }
        if let Some(v) = env_parse::<f64>("SPYKE_CURATION_BIN_SIZE") {
            curation.bin_size = Some(v);
        }
        if let Some(v) = env_parse::<f64>("SPYKE_CURATION_DISTRIBUTION_THRESHOLD") {
            curation.distribution_threshold = Some(v);
        }
        if let Some(v) = env_parse::<f64>("SPYKE_CURATION_CORRELATION_THRESHOLD") {
            curation.correlation_threshold = Some(v);
        }
        if let Some(v) = env_parse::<bool>("SPYKE_CURATION_PARALLEL") {
            curation.parallel = Some(v);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut SpykeConfig, cli: &CliOverrides) {
        if let Some(v) = cli.recursive {
            config.curation.recursive = Some(v);
        }
        if let Some(v) = cli.remove_noise_units {
            config.curation.remove_noise_units = Some(v);
        }
        if let Some(v) = cli.bin_size {
            config.curation.bin_size = Some(v);
        }
        if let Some(v) = cli.correlation_threshold {
            config.curation.correlation_threshold = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Read and parse an environment variable, ignoring unparsable values.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}
