use prometheus::core::Desc;
use prometheus::proto::{self, MetricType};

/// Kind of value a sample carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Value may rise or fall between scrapes
    Gauge,
    /// Value only increases over the process lifetime
    Counter,
}

impl SampleKind {
    /// Protobuf metric type used by the exposition encoder
    pub fn metric_type(self) -> MetricType {
        match self {
            SampleKind::Gauge => MetricType::GAUGE,
            SampleKind::Counter => MetricType::COUNTER,
        }
    }
}

/// A single metric value produced by one collection pass.
///
/// Samples are built fresh on every scrape from a static descriptor and are
/// never cached between scrapes.
#[derive(Debug, Clone)]
pub struct Sample {
    desc: Desc,
    kind: SampleKind,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// Creates a gauge sample; `label_values` follow the descriptor's variable labels
    pub fn gauge(desc: &Desc, value: f64, label_values: Vec<String>) -> Self {
        Self {
            desc: desc.clone(),
            kind: SampleKind::Gauge,
            value,
            label_values,
        }
    }

    /// Creates an unlabeled counter sample
    pub fn counter(desc: &Desc, value: f64) -> Self {
        Self {
            desc: desc.clone(),
            kind: SampleKind::Counter,
            value,
            label_values: Vec::new(),
        }
    }

    /// Fully-qualified metric name
    pub fn name(&self) -> &str {
        &self.desc.fq_name
    }

    /// Help text of the metric
    pub fn help(&self) -> &str {
        &self.desc.help
    }

    /// Descriptor this sample was built from
    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Sample kind
    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Sample value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value of the label `name`, if the descriptor declares it
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .variable_labels
            .iter()
            .position(|label| label == name)
            .and_then(|idx| self.label_values.get(idx))
            .map(String::as_str)
    }

    /// Converts the sample into a protobuf metric.
    ///
    /// Fails when the number of label values does not match the descriptor.
    pub fn to_metric(&self) -> crate::Result<proto::Metric> {
        if self.label_values.len() != self.desc.variable_labels.len() {
            return Err(prometheus::Error::InconsistentCardinality {
                expect: self.desc.variable_labels.len(),
                got: self.label_values.len(),
            }
            .into());
        }

        let mut metric = proto::Metric::default();
        for (name, value) in self.desc.variable_labels.iter().zip(&self.label_values) {
            let mut pair = proto::LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            metric.mut_label().push(pair);
        }

        match self.kind {
            SampleKind::Gauge => {
                let mut gauge = proto::Gauge::default();
                gauge.set_value(self.value);
                metric.set_gauge(gauge);
            }
            SampleKind::Counter => {
                let mut counter = proto::Counter::default();
                counter.set_value(self.value);
                metric.set_counter(counter);
            }
        }

        Ok(metric)
    }
}
