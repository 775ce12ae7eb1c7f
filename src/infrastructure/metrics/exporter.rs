use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Renders metric families in the Prometheus text exposition format
pub fn encode_text(families: &[MetricFamily]) -> crate::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(families, &mut buffer)?;
    // The text encoder only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
