//! Domain layer: bucket identifiers, metric samples, errors and the bucket collector

/// Per-bucket object count collector
pub mod collector;
/// Metric samples produced by a scrape
pub mod sample;
/// Core types and errors
pub mod types;

pub use collector::BucketExporter;
pub use sample::{Sample, SampleKind};
pub use types::*;
