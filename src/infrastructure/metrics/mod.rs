//! Scrape-time metric collection and text exposition
//!
//! Collectors register once with a [`ScrapeRegistry`], which runs all of them
//! on every scrape and hands the resulting metric families to the text encoder.

/// Collector trait and scrape registry
pub mod collector;
/// Text exposition encoding
pub mod exporter;

pub use collector::*;
pub use exporter::*;
