#![allow(dead_code)]

use async_trait::async_trait;
use s3_exporter::*;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Dispatch;

/// What the fake backend answers for one page request
#[derive(Debug, Clone)]
pub enum Step {
    /// A page holding this many objects
    Page(usize),
    /// A page that arrives after a delay
    SlowPage(usize, Duration),
    /// A failed request
    Fail(&'static str),
    /// A request that never completes
    Hang,
}

/// In-memory page source; continuation tokens are page indexes
#[derive(Default)]
pub struct FakeBucketStore {
    buckets: Mutex<HashMap<String, Vec<Step>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, name: &str, steps: Vec<Step>) -> Self {
        self.set_bucket(name, steps);
        self
    }

    /// Replaces the script of `name` for later requests
    pub fn set_bucket(&self, name: &str, steps: Vec<Step>) {
        self.buckets
            .lock()
            .unwrap()
            .insert(name.to_string(), steps);
    }

    /// Total page requests served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Page requests made for `bucket`, in order
    pub fn requests_for(&self, bucket: &str) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, _)| b == bucket)
            .map(|(_, token)| token.clone())
            .collect()
    }
}

#[async_trait]
impl PageSource for FakeBucketStore {
    async fn list_page(
        &self,
        bucket: &BucketName,
        continuation: Option<String>,
    ) -> s3_exporter::Result<ObjectPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((bucket.0.clone(), continuation.clone()));

        let steps = self
            .buckets
            .lock()
            .unwrap()
            .get(bucket.as_str())
            .cloned()
            .ok_or_else(|| ExporterError::list_objects(bucket, "NoSuchBucket"))?;
        let idx = match continuation {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ExporterError::list_objects(bucket, "InvalidToken"))?,
        };
        let page = |count: usize| {
            if idx + 1 < steps.len() {
                ObjectPage::with_next(count, (idx + 1).to_string())
            } else {
                ObjectPage::last(count)
            }
        };

        match steps.get(idx) {
            Some(Step::Page(count)) => Ok(page(*count)),
            Some(Step::SlowPage(count, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(page(*count))
            }
            Some(Step::Fail(reason)) => Err(ExporterError::list_objects(bucket, *reason)),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(ExporterError::list_objects(bucket, "InvalidToken")),
        }
    }
}

/// Builds a collector over `store` with logging disabled
pub fn exporter(store: Arc<FakeBucketStore>, buckets: &[&str]) -> Arc<BucketExporter> {
    exporter_with_logger(store, buckets, Dispatch::none())
}

pub fn exporter_with_logger(
    store: Arc<FakeBucketStore>,
    buckets: &[&str],
    logger: Dispatch,
) -> Arc<BucketExporter> {
    Arc::new(
        BucketExporter::new(
            logger,
            Arc::new(PaginatedCounter::new(store)),
            buckets.iter().map(|b| BucketName::from(*b)).collect(),
        )
        .unwrap(),
    )
}

/// Runs one collection pass and returns every emitted sample in order
pub async fn collect(exporter: &BucketExporter, cancel: &CancellationToken) -> Vec<Sample> {
    let (tx, mut rx) = mpsc::channel(4);
    let produce = async move { exporter.collect(cancel, &tx).await };
    let consume = async {
        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }
        samples
    };
    let ((), samples) = tokio::join!(produce, consume);
    samples
}

/// Bucket gauges of a pass as (bucket, value) pairs
pub fn gauges(samples: &[Sample]) -> Vec<(String, f64)> {
    samples
        .iter()
        .filter(|s| s.kind() == SampleKind::Gauge)
        .map(|s| (s.label("bucket").unwrap_or_default().to_string(), s.value()))
        .collect()
}

/// Value of the error counter sample of a pass
pub fn errors_total(samples: &[Sample]) -> f64 {
    samples
        .iter()
        .find(|s| s.kind() == SampleKind::Counter)
        .map(|s| s.value())
        .expect("error counter sample")
}

/// Log sink writing formatted events into memory
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn dispatch(&self) -> Dispatch {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        Dispatch::new(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
