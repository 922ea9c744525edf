// Single source of truth for all default values.

// --- Curation ---
pub const DEFAULT_RECURSIVE: bool = true;
pub const DEFAULT_REMOVE_NOISE_UNITS: bool = false;
pub const DEFAULT_AMPLITUDE_THRESHOLD: f64 = 5_000.0; // µV
pub const DEFAULT_BIN_SIZE: f64 = 0.01;
pub const DEFAULT_DISTRIBUTION_THRESHOLD: f64 = 0.001;
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.8;
pub const DEFAULT_PARALLEL: bool = true;

// --- Persistence ---
pub const DEFAULT_PROJECT_CONFIG_FILENAME: &str = "spyke.toml";

// --- Observability ---
pub const DEFAULT_LOG_FILTER: &str = "spyke_core=info,spyke_curation=info";
pub const LOG_ENV_VAR: &str = "SPYKE_LOG";
