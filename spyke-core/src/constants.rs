//! Empirically tuned curation constants.
//!
//! These were calibrated on real recordings and are kept as-is. They are
//! collected here so a re-calibration touches a single file.

/// Engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// --- Metric classifier ---

/// A unit with exactly this many refractory violations is `clean`.
pub const CLEAN_VIOLATION_COUNT: f64 = 0.0;

/// Units with fewer spikes than this are left `raw`.
pub const MIN_ANALYZABLE_SPIKES: f64 = 3000.0;

/// False-discovery ratio (violations / spikes) above which a unit is contaminated.
pub const CONTAMINATION_FDR: f64 = 0.1;

/// Presence ratio under which a unit counts as time-restricted.
pub const TIME_RESTRICTED_PRESENCE: f64 = 0.8;

/// Violation count above which a time-restricted, low-cutoff unit is noise.
pub const CLEAN_NOISE_VIOLATIONS: f64 = 100.0;

// --- Correlation distribution analyzer ---

/// A recursive MUA candidate at or below this size is split once, not decomposed.
pub const RECURSION_FLOOR_SPIKES: usize = 3000;

/// Half-width (samples) excluded around the peak when looking for window bounds.
pub const WINDOW_PEAK_GUARD: usize = 2;

/// Fallback window start, in samples before the peak.
pub const WINDOW_FALLBACK_BEFORE: usize = 5;

/// Fallback window stop, in samples after the peak.
pub const WINDOW_FALLBACK_AFTER: usize = 10;

/// Fraction of the histogram below which an un-troughed point of interest means `noisy`.
pub const NOISY_GOOD_BOUNDARY: f64 = 2.0 / 3.0;
