//! Curation configuration.

use serde::{Deserialize, Serialize};

use super::defaults;

/// Configuration for the curation pass.
///
/// Every field is optional so that layered sources can be merged; use the
/// `effective_*` accessors to read the resolved value.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CurationConfig {
    /// Recursively decompose MUA units. Default: true.
    pub recursive: Option<bool>,
    /// Delete units labeled `noise` from the sorting. Default: false.
    pub remove_noise_units: Option<bool>,
    /// Spikes with a peak amplitude above this are dropped as artifacts. Default: 5000.
    pub amplitude_threshold: Option<f64>,
    /// Correlation histogram bin width. Default: 0.01.
    pub bin_size: Option<f64>,
    /// Fraction of the spike count used as the histogram decision floor. Default: 0.001.
    pub distribution_threshold: Option<f64>,
    /// Minimum correlation for a trash spike to join another unit. Default: 0.8.
    pub correlation_threshold: Option<f64>,
    /// Analyze units on the rayon pool. Default: true.
    pub parallel: Option<bool>,
}

impl CurationConfig {
    /// Returns whether MUA decomposition recurses, defaulting to true.
    pub fn effective_recursive(&self) -> bool {
        self.recursive.unwrap_or(defaults::DEFAULT_RECURSIVE)
    }

    /// Returns whether noise units are deleted, defaulting to false.
    pub fn effective_remove_noise_units(&self) -> bool {
        self.remove_noise_units
            .unwrap_or(defaults::DEFAULT_REMOVE_NOISE_UNITS)
    }

    /// Returns the artifact amplitude threshold, defaulting to 5000.
    pub fn effective_amplitude_threshold(&self) -> f64 {
        self.amplitude_threshold
            .unwrap_or(defaults::DEFAULT_AMPLITUDE_THRESHOLD)
    }

    /// Returns the histogram bin width, defaulting to 0.01.
    pub fn effective_bin_size(&self) -> f64 {
        self.bin_size.unwrap_or(defaults::DEFAULT_BIN_SIZE)
    }

    /// Returns the distribution threshold fraction, defaulting to 0.001.
    pub fn effective_distribution_threshold(&self) -> f64 {
        self.distribution_threshold
            .unwrap_or(defaults::DEFAULT_DISTRIBUTION_THRESHOLD)
    }

    /// Returns the reassignment correlation cut, defaulting to 0.8.
    pub fn effective_correlation_threshold(&self) -> f64 {
        self.correlation_threshold
            .unwrap_or(defaults::DEFAULT_CORRELATION_THRESHOLD)
    }

    /// Returns whether unit analysis runs in parallel, defaulting to true.
    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(defaults::DEFAULT_PARALLEL)
    }
}
