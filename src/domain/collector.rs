use crate::domain::sample::Sample;
use crate::domain::types::BucketName;
use crate::infrastructure::metrics::Collector;
use crate::infrastructure::storage::ObjectStore;
use crate::NAMESPACE;
use async_trait::async_trait;
use prometheus::core::Desc;
use prometheus::Opts;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, Dispatch};

/// Counts the objects in a fixed set of buckets on every scrape.
///
/// Each pass lists the buckets one after the other in configured order. A
/// bucket whose listing fails is logged, bumps `errors_total` by one and gets
/// no `bucket_item_count` sample for that pass; the remaining buckets are
/// unaffected. The error counter sample is always emitted last.
///
/// Counts are exported as `f64`, so values above 2^53 lose precision.
pub struct BucketExporter {
    logger: Dispatch,
    store: Arc<dyn ObjectStore>,
    buckets: Vec<BucketName>,
    errors: AtomicU64,
    errors_desc: Desc,
    bucket_item_count: Desc,
}

impl BucketExporter {
    /// Creates an exporter with its error counter at zero.
    ///
    /// No I/O happens here. `logger` receives the per-bucket failure records.
    pub fn new(
        logger: Dispatch,
        store: Arc<dyn ObjectStore>,
        buckets: Vec<BucketName>,
    ) -> crate::Result<Self> {
        let errors_opts = Opts::new("errors_total", "Total number of errors").namespace(NAMESPACE);
        let errors_desc = Desc::new(
            errors_opts.fq_name(),
            errors_opts.help.clone(),
            Vec::new(),
            HashMap::new(),
        )?;

        let count_opts = Opts::new("bucket_item_count", "Number of items in given bucket")
            .namespace(NAMESPACE);
        let bucket_item_count = Desc::new(
            count_opts.fq_name(),
            count_opts.help.clone(),
            vec!["bucket".to_string()],
            HashMap::new(),
        )?;

        Ok(Self {
            logger,
            store,
            buckets,
            errors: AtomicU64::new(0),
            errors_desc,
            bucket_item_count,
        })
    }

    /// Configured buckets in scrape order
    pub fn buckets(&self) -> &[BucketName] {
        &self.buckets
    }

    /// Cumulative number of failed bucket listings
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Descriptor of the per-bucket gauge
    pub fn bucket_item_count_desc(&self) -> &Desc {
        &self.bucket_item_count
    }

    /// Descriptor of the error counter
    pub fn errors_desc(&self) -> &Desc {
        &self.errors_desc
    }
}

#[async_trait]
impl Collector for BucketExporter {
    /// Only the error counter is advertised; bucket gauges are described by the samples themselves.
    fn describe(&self) -> Vec<Desc> {
        vec![self.errors_desc.clone()]
    }

    async fn collect(&self, cancel: &CancellationToken, tx: &mpsc::Sender<Sample>) {
        for bucket in &self.buckets {
            match self.store.count_objects(bucket, cancel).await {
                Ok(count) => {
                    tracing::dispatcher::with_default(&self.logger, || {
                        debug!(bucket = %bucket, count, "Counted objects");
                    });
                    let sample = Sample::gauge(
                        &self.bucket_item_count,
                        count as f64,
                        vec![bucket.0.clone()],
                    );
                    if tx.send(sample).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::dispatcher::with_default(&self.logger, || {
                        error!(err = %e, bucket = %bucket, "Couldn't list objects");
                    });
                    self.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let total = Sample::counter(&self.errors_desc, self.error_count() as f64);
        let _ = tx.send(total).await;
    }
}
