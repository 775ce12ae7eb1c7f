//! # S3 Exporter
//!
//! Counts the objects in the configured S3 buckets on every Prometheus scrape
//! and serves the result over HTTP.

use anyhow::Context;
use clap::Parser;
use s3_exporter::utils::logger::setup_logger;
use s3_exporter::*;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = setup_logger() {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    let config = Config::parse();

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let address = config.socket_addr()?;
    let buckets = config.bucket_names();

    info!("Starting s3-exporter v{}", VERSION);
    info!("Exporting object counts for {} bucket(s)", buckets.len());

    let source = S3PageSource::from_env().await?;
    let store = Arc::new(PaginatedCounter::new(source));

    let logger = tracing::dispatcher::get_default(|dispatch| dispatch.clone());
    let exporter = BucketExporter::new(logger, store, buckets)
        .context("Couldn't build bucket exporter")?;

    let registry = Arc::new(ScrapeRegistry::new());
    registry
        .register(Arc::new(exporter))
        .context("Couldn't register bucket exporter")?;

    let state = Arc::new(HttpState::new(
        registry,
        config.metrics_path.clone(),
        config.scrape_timeout,
    ));

    serve(state, address, shutdown_signal())
        .await
        .context("Server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
