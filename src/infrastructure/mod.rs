//! Infrastructure layer: configuration, object storage access, metrics exposition and HTTP
//!
//! These modules connect the collector in the domain layer to the outside
//! world. None of them holds state beyond what a single scrape needs.

/// Command-line and environment configuration
pub mod config;
/// HTTP routes and server
pub mod http;
/// Scrape registry and text exposition
pub mod metrics;
/// Object storage capabilities and the S3 backend
pub mod storage;

pub use config::Config;
pub use metrics::{encode_text, Collector, ScrapeRegistry};
pub use storage::{ObjectPage, ObjectStore, PageSource, PaginatedCounter, S3PageSource};
