use crate::domain::types::{BucketName, ExporterError};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Command-line configuration; every flag can also come from the environment
#[derive(Debug, Clone, Parser)]
#[command(name = "s3-exporter", version, about = "Exports S3 bucket object counts to Prometheus")]
pub struct Config {
    /// Address on which to expose metrics
    #[arg(
        long = "telemetry.address",
        env = "S3_EXPORTER_ADDRESS",
        default_value = ":8080"
    )]
    pub listen_address: String,

    /// Path under which to expose metrics
    #[arg(
        long = "telemetry.endpoint",
        env = "S3_EXPORTER_ENDPOINT",
        default_value = "/metrics"
    )]
    pub metrics_path: String,

    /// Bucket to get metrics for (repeatable)
    #[arg(
        short = 'b',
        long = "bucket",
        env = "S3_EXPORTER_BUCKETS",
        value_delimiter = ','
    )]
    pub buckets: Vec<String>,

    /// Upper bound on the time one scrape may spend listing buckets
    #[arg(
        long = "scrape.timeout",
        env = "S3_EXPORTER_SCRAPE_TIMEOUT",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub scrape_timeout: Duration,
}

impl Config {
    /// Checks the settings that clap cannot express
    pub fn validate(&self) -> crate::Result<()> {
        if self.bucket_names().is_empty() {
            return Err(ExporterError::NoBuckets);
        }
        if !self.metrics_path.starts_with('/') || self.metrics_path == "/" {
            return Err(ExporterError::InvalidMetricsPath(self.metrics_path.clone()));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Configured buckets with blanks and duplicates removed, first occurrence kept
    pub fn bucket_names(&self) -> Vec<BucketName> {
        let mut names: Vec<BucketName> = Vec::with_capacity(self.buckets.len());
        for bucket in &self.buckets {
            let bucket = bucket.trim();
            if bucket.is_empty() || names.iter().any(|b| b.as_str() == bucket) {
                continue;
            }
            names.push(BucketName::from(bucket));
        }
        names
    }

    /// Parses the listen address; a bare `:port` binds every interface.
    ///
    /// Only IP literals are accepted, hostnames are never resolved.
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        let address = if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        };

        address
            .parse::<SocketAddr>()
            .map_err(|_| ExporterError::InvalidListenAddress(self.listen_address.clone()))
    }
}
