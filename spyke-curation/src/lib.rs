//! # spyke-curation
//!
//! Curation of spike-sorted units.
//!
//! Metric classification → per-channel correlation analysis → unit
//! aggregation → split/merge execution → trash reassignment, orchestrated
//! by [`engine::CurationEngine`].

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod engine;
pub mod executor;
pub mod prefilter;
pub mod reassignment;

pub use analyzer::{identify, AnalyzerParams, ChannelVerdict};
pub use engine::{CurationEngine, CurationReport, CurationStats, GroupFailure, UnitAnalysis};
