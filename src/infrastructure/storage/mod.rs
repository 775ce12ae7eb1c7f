//! Object storage access
//!
//! The collector only needs one capability from the storage backend: count
//! every object in a bucket. [`ObjectStore`] is that capability. Backends that
//! list objects page by page implement [`PageSource`] instead and are wrapped
//! in a [`PaginatedCounter`], which drives the page loop and observes the
//! scrape's cancellation token.

/// Amazon S3 page source
pub mod s3;

pub use s3::S3PageSource;

use crate::domain::types::{BucketName, ExporterError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Counts all objects in a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the number of objects in `bucket`.
    ///
    /// Fails as a whole if any part of the enumeration fails; no partial
    /// count is ever returned.
    async fn count_objects(
        &self,
        bucket: &BucketName,
        cancel: &CancellationToken,
    ) -> crate::Result<u64>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn count_objects(
        &self,
        bucket: &BucketName,
        cancel: &CancellationToken,
    ) -> crate::Result<u64> {
        (**self).count_objects(bucket, cancel).await
    }
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Number of objects on this page
    pub object_count: usize,
    /// Token for the next page; `None` when this is the last page
    pub next: Option<String>,
}

impl ObjectPage {
    /// Last page of a listing
    pub fn last(object_count: usize) -> Self {
        Self {
            object_count,
            next: None,
        }
    }

    /// Page followed by another one
    pub fn with_next(object_count: usize, next: impl Into<String>) -> Self {
        Self {
            object_count,
            next: Some(next.into()),
        }
    }
}

/// Lists a bucket one page at a time
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the page that `continuation` points to, or the first page when `None`
    async fn list_page(
        &self,
        bucket: &BucketName,
        continuation: Option<String>,
    ) -> crate::Result<ObjectPage>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn list_page(
        &self,
        bucket: &BucketName,
        continuation: Option<String>,
    ) -> crate::Result<ObjectPage> {
        (**self).list_page(bucket, continuation).await
    }
}

/// [`ObjectStore`] that sums object counts over every page of a [`PageSource`]
#[derive(Debug, Clone)]
pub struct PaginatedCounter<S> {
    source: S,
}

impl<S: PageSource> PaginatedCounter<S> {
    /// Wraps a page source
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the wrapped page source
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: PageSource> ObjectStore for PaginatedCounter<S> {
    async fn count_objects(
        &self,
        bucket: &BucketName,
        cancel: &CancellationToken,
    ) -> crate::Result<u64> {
        let mut total = 0u64;
        let mut pages = 0u64;
        let mut continuation = None;

        // Page N+1 is requested only once page N has arrived.
        loop {
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ExporterError::Cancelled {
                        bucket: bucket.clone(),
                        pages,
                    });
                }
                page = self.source.list_page(bucket, continuation.take()) => page?,
            };

            pages += 1;
            total += page.object_count as u64;
            trace!(
                bucket = %bucket,
                page = pages,
                objects = page.object_count,
                "Received listing page"
            );

            match page.next {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        Ok(total)
    }
}
