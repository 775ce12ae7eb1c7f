use crate::domain::sample::Sample;
use crate::domain::types::ExporterError;
use async_trait::async_trait;
use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Capacity of the channel between collectors and the gatherer
const SAMPLE_BUFFER: usize = 64;

/// Source of metric samples, asked for fresh values on every scrape
#[async_trait]
pub trait Collector: Send + Sync {
    /// Descriptors this collector advertises at registration time.
    ///
    /// Must be free of side effects.
    fn describe(&self) -> Vec<Desc>;

    /// Sends this scrape's samples into `tx`.
    ///
    /// Never fails as a whole; `cancel` fires when the scrape deadline passes.
    async fn collect(&self, cancel: &CancellationToken, tx: &mpsc::Sender<Sample>);
}

/// Set of collectors gathered together on each scrape
#[derive(Default)]
pub struct ScrapeRegistry {
    collectors: RwLock<Vec<Arc<dyn Collector>>>,
    names: RwLock<HashSet<String>>,
}

impl ScrapeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collector after checking its descriptors against those already known
    pub fn register(&self, collector: Arc<dyn Collector>) -> crate::Result<()> {
        let descs = collector.describe();

        let mut names = self
            .names
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut seen = HashSet::new();
        for desc in &descs {
            if names.contains(&desc.fq_name) || !seen.insert(desc.fq_name.clone()) {
                return Err(ExporterError::AlreadyRegistered(desc.fq_name.clone()));
            }
        }
        names.extend(seen);

        self.collectors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(collector);
        Ok(())
    }

    /// Number of registered collectors
    pub fn len(&self) -> usize {
        self.collectors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one collection pass over every collector in registration order and
    /// groups the samples into metric families, keeping first-seen order.
    pub async fn gather(&self, cancel: &CancellationToken) -> Vec<MetricFamily> {
        let collectors = self
            .collectors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let (tx, mut rx) = mpsc::channel(SAMPLE_BUFFER);
        let produce = async move {
            for collector in &collectors {
                collector.collect(cancel, &tx).await;
            }
        };
        let consume = async {
            let mut samples = Vec::new();
            while let Some(sample) = rx.recv().await {
                samples.push(sample);
            }
            samples
        };
        let ((), samples) = tokio::join!(produce, consume);

        group_samples(samples)
    }
}

/// Groups samples sharing a metric name into one family each
pub fn group_samples(samples: Vec<Sample>) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = Vec::new();

    for sample in samples {
        let metric = match sample.to_metric() {
            Ok(metric) => metric,
            Err(e) => {
                warn!(metric = sample.name(), error = %e, "Dropping malformed sample");
                continue;
            }
        };

        match families.iter_mut().find(|f| f.get_name() == sample.name()) {
            Some(family) => family.mut_metric().push(metric),
            None => {
                let mut family = MetricFamily::default();
                family.set_name(sample.name().to_string());
                family.set_help(sample.help().to_string());
                family.set_field_type(sample.kind().metric_type());
                family.mut_metric().push(metric);
                families.push(family);
            }
        }
    }

    families
}
