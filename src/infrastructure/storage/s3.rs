use super::{ObjectPage, PageSource};
use crate::domain::types::{BucketName, ExporterError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

/// Lists bucket contents through the S3 `ListObjectsV2` API
#[derive(Debug, Clone)]
pub struct S3PageSource {
    client: Client,
}

impl S3PageSource {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the standard AWS configuration chain
    /// (environment, shared config files, instance metadata).
    ///
    /// Fails when no region can be resolved.
    pub async fn from_env() -> crate::Result<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        if config.region().is_none() {
            return Err(ExporterError::Session(
                "no region configured; set AWS_REGION or a profile region".to_string(),
            ));
        }

        Ok(Self::new(Client::new(&config)))
    }

    /// Underlying SDK client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageSource for S3PageSource {
    async fn list_page(
        &self,
        bucket: &BucketName,
        continuation: Option<String>,
    ) -> crate::Result<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket.as_str())
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| ExporterError::list_objects(bucket, DisplayErrorContext(&e).to_string()))?;

        let object_count = output.contents().len();
        if !output.is_truncated().unwrap_or(false) {
            return Ok(ObjectPage::last(object_count));
        }

        match output.next_continuation_token() {
            Some(token) => Ok(ObjectPage::with_next(object_count, token)),
            None => Err(ExporterError::TruncatedWithoutToken {
                bucket: bucket.clone(),
            }),
        }
    }
}
