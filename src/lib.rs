//! # S3 Exporter
//!
//! A Prometheus exporter that counts the objects stored in a fixed set of S3
//! buckets every time it is scraped.
//!
//! ## Architecture
//!
//! - **Domain**: the bucket collector ([`BucketExporter`]), metric samples and errors
//! - **Infrastructure**: object storage access, the scrape registry, text
//!   exposition, configuration and the HTTP surface
//! - **Utils**: process-wide logging setup
//!
//! ## Scrape flow
//!
//! An HTTP request to the metrics path runs one pass over the
//! [`ScrapeRegistry`]. The collector lists every configured bucket in order,
//! following continuation tokens until the provider reports the last page,
//! and emits one `s3_bucket_item_count{bucket=...}` gauge per bucket that
//! succeeded, followed by the cumulative `s3_errors_total` counter.
//!
//! A failing bucket never fails the scrape: it is logged, counted in
//! `s3_errors_total`, and simply missing from that scrape's gauges.

pub mod domain;
pub mod infrastructure;

/// Utilities for logging
pub mod utils;

pub use domain::{
    collector::BucketExporter,
    sample::{Sample, SampleKind},
    types::*,
};

pub use infrastructure::{
    config::Config,
    http::{routes, serve, HttpState},
    metrics::{encode_text, Collector, ScrapeRegistry, CONTENT_TYPE},
    storage::{ObjectPage, ObjectStore, PageSource, PaginatedCounter, S3PageSource},
};

/// Main result type for the exporter
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Prefix of every exported metric name
pub const NAMESPACE: &str = "s3";

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
