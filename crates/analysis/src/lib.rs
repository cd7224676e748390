//! # Analysis
//!
//! Streaming lap assembly, single-pass metrics extraction, and lap
//! comparison.
//!
//! The lap assembler is a stateful bus subscriber; the extraction and
//! comparison functions are pure and deterministic: identical input always
//! produces identical output.

mod assembler;
mod braking;
mod compare;
mod corner;
mod extract;
mod math;

pub use assembler::LapAssembler;
pub use braking::extract_braking_zones;
pub use compare::{compare, CompareConfig};
pub use corner::extract_corners;
pub use extract::{extract_lap_metrics, MetricsExtractor};
pub use math::{wrap_delta, wrap_separation};

// Re-export the threshold bundle next to the functions that consume it.
pub use contracts::AnalysisConfig;
