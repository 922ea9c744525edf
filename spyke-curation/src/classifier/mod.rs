//! Metric classifier: obvious verdicts from quality metrics alone.

pub mod metric_rules;
pub mod noise_units;

pub use metric_rules::{classify_obvious_units, ObviousRule};
pub use noise_units::find_noise_units;
