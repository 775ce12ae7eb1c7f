use crate::domain::types::ExporterError;
use crate::infrastructure::metrics::{encode_text, ScrapeRegistry, CONTENT_TYPE};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use warp::http::{HeaderMap, HeaderValue, StatusCode};
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

/// Header Prometheus uses to tell targets how long it will wait for a scrape
pub const SCRAPE_TIMEOUT_HEADER: &str = "x-prometheus-scrape-timeout-seconds";

/// Shared state behind the HTTP routes
pub struct HttpState {
    registry: Arc<ScrapeRegistry>,
    metrics_path: String,
    scrape_timeout: Duration,
}

impl HttpState {
    /// Creates the route state
    pub fn new(
        registry: Arc<ScrapeRegistry>,
        metrics_path: impl Into<String>,
        scrape_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            metrics_path: metrics_path.into(),
            scrape_timeout,
        }
    }

    /// Deadline for one scrape: the Prometheus header when given, capped by the configured timeout
    pub fn scrape_deadline(&self, header: Option<f64>) -> Duration {
        match header {
            Some(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs)
                .map_or(self.scrape_timeout, |d| d.min(self.scrape_timeout)),
            _ => self.scrape_timeout,
        }
    }
}

/// Reads the scrape timeout hint; a missing or unparsable value is ignored
pub fn scrape_timeout_hint(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(SCRAPE_TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
}

fn index_page(metrics_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>S3 Exporter</title></head>\n\
         <body>\n\
         <h1>S3 Exporter</h1>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        metrics_path
    )
}

/// Builds the exporter's routes: a landing page at `/` and the metrics path
pub fn routes(
    state: Arc<HttpState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let page = index_page(&state.metrics_path);
    let index = warp::get()
        .and(warp::path::end())
        .map(move || warp::reply::html(page.clone()));

    let path_state = state.clone();
    let metrics = warp::get()
        .and(warp::path::full())
        .and_then(move |full: FullPath| {
            let state = path_state.clone();
            async move {
                if full.as_str() == state.metrics_path {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one()
        .and(
            warp::header::headers_cloned()
                .map(|headers: HeaderMap| scrape_timeout_hint(&headers)),
        )
        .and(warp::any().map(move || state.clone()))
        .and_then(handle_metrics);

    index.or(metrics)
}

async fn handle_metrics(
    timeout_header: Option<f64>,
    state: Arc<HttpState>,
) -> Result<impl Reply, Infallible> {
    let deadline = state.scrape_deadline(timeout_header);
    debug!(deadline_ms = deadline.as_millis() as u64, "Starting scrape");

    let cancel = CancellationToken::new();
    let timer = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(deadline).await;
            cancel.cancel();
        }
    });

    let families = state.registry.gather(&cancel).await;
    timer.abort();

    let (body, status) = match encode_text(&families) {
        Ok(body) => (body, StatusCode::OK),
        Err(e) => {
            error!(err = %e, "Couldn't encode metrics");
            (e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(warp::reply::with_status(
        warp::reply::with_header(body, "content-type", CONTENT_TYPE),
        status,
    ))
}

/// Binds `address` and serves until `shutdown` resolves
pub async fn serve(
    state: Arc<HttpState>,
    address: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(address, shutdown)
        .map_err(ExporterError::Server)?;

    info!(address = %bound, "Starting server");
    server.await;
    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(timeout: Duration) -> HttpState {
        HttpState::new(Arc::new(ScrapeRegistry::new()), "/metrics", timeout)
    }

    #[test]
    fn test_scrape_deadline_from_header() {
        let state = state(Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(None), Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(10.0)), Duration::from_secs(10));
        assert_eq!(state.scrape_deadline(Some(60.0)), Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(0.0)), Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(-1.0)), Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(1e30)), Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(f64::MAX)), Duration::from_secs(30));
    }

    #[test]
    fn test_scrape_deadline_out_of_range_values() {
        let state = state(Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(f64::INFINITY)), Duration::from_secs(30));
        assert_eq!(state.scrape_deadline(Some(f64::NAN)), Duration::from_secs(30));
        assert_eq!(
            state.scrape_deadline(Some(0.25)),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_scrape_timeout_hint_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(scrape_timeout_hint(&headers), None);

        headers.insert(SCRAPE_TIMEOUT_HEADER, HeaderValue::from_static("9.5"));
        assert_eq!(scrape_timeout_hint(&headers), Some(9.5));

        headers.insert(SCRAPE_TIMEOUT_HEADER, HeaderValue::from_static("10s"));
        assert_eq!(scrape_timeout_hint(&headers), None);

        headers.insert(SCRAPE_TIMEOUT_HEADER, HeaderValue::from_bytes(b"\xff").unwrap());
        assert_eq!(scrape_timeout_hint(&headers), None);
    }

    #[test]
    fn test_index_page_links_metrics() {
        let page = index_page("/s3/metrics");
        assert!(page.contains("<title>S3 Exporter</title>"));
        assert!(page.contains("<a href=\"/s3/metrics\">Metrics</a>"));
    }
}
