use std::fmt;

/// Boxed error type carried as the source of provider failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Name of an object storage bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketName(pub String);

impl BucketName {
    /// Returns the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BucketName {
    fn from(name: &str) -> Self {
        BucketName(name.to_string())
    }
}

impl From<String> for BucketName {
    fn from(name: String) -> Self {
        BucketName(name)
    }
}

/// Exporter errors
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// A listing request for a bucket failed
    #[error("couldn't list objects in bucket {bucket}: {source}")]
    ListObjects {
        /// Bucket being enumerated
        bucket: BucketName,
        /// Underlying provider or transport error
        #[source]
        source: BoxError,
    },

    /// The scrape deadline fired while a bucket was being enumerated
    #[error("listing of bucket {bucket} cancelled after {pages} page(s)")]
    Cancelled {
        /// Bucket being enumerated
        bucket: BucketName,
        /// Pages fully received before cancellation
        pages: u64,
    },

    /// The provider reported more pages without handing out a continuation token
    #[error("listing of bucket {bucket} is truncated but has no continuation token")]
    TruncatedWithoutToken {
        /// Bucket being enumerated
        bucket: BucketName,
    },

    /// No bucket was configured
    #[error("you need to specify at least one bucket with -b")]
    NoBuckets,

    /// Listen address could not be parsed
    #[error("invalid listen address {0:?}")]
    InvalidListenAddress(String),

    /// Metrics path is not usable as a route
    #[error("invalid metrics path {0:?}: must start with '/' and must not be '/'")]
    InvalidMetricsPath(String),

    /// The storage provider client could not be configured
    #[error("couldn't create AWS session: {0}")]
    Session(String),

    /// Metric descriptor or encoding error
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// A descriptor with the same fully-qualified name is already registered
    #[error("metric {0} is already registered")]
    AlreadyRegistered(String),

    /// HTTP server failure
    #[error("server error: {0}")]
    Server(#[from] warp::Error),
}

impl ExporterError {
    /// Wraps a provider error as a listing failure for `bucket`
    pub fn list_objects(bucket: &BucketName, source: impl Into<BoxError>) -> Self {
        ExporterError::ListObjects {
            bucket: bucket.clone(),
            source: source.into(),
        }
    }

    /// Returns the bucket this error is about, if any
    pub fn bucket(&self) -> Option<&BucketName> {
        match self {
            ExporterError::ListObjects { bucket, .. }
            | ExporterError::Cancelled { bucket, .. }
            | ExporterError::TruncatedWithoutToken { bucket } => Some(bucket),
            _ => None,
        }
    }
}
