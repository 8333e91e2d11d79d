//! S3-compatible object store (AWS S3, MinIO).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use tomblr_core::config::StorageConfig;
use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::traits::object_store::{ObjectMeta, ObjectStore, PresignedUpload};

/// Object store backed by a single S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    bucket_ready: std::sync::Arc<OnceCell<()>>,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// Static credentials are used when both keys are set; otherwise the
    /// default AWS credential chain applies.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 object store"
        );

        if config.bucket.is_empty() {
            return Err(AppError::configuration("storage.bucket must not be empty"));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() && !config.secret_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "tomblr-config",
            ));
        }
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(config.endpoint.clone());
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            bucket_ready: std::sync::Arc::new(OnceCell::new()),
        })
    }

    async fn create_bucket_if_missing(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                debug!(bucket = %self.bucket, "Bucket exists");
                return Ok(());
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {}
            Err(e) => return Err(s3_error("Failed to check bucket", e)),
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!(bucket = %self.bucket, "Created bucket");
                Ok(())
            }
            Err(e)
                if e.as_service_error().is_some_and(|se| {
                    se.is_bucket_already_owned_by_you() || se.is_bucket_already_exists()
                }) =>
            {
                Ok(())
            }
            Err(e) => Err(s3_error("Failed to create bucket", e)),
        }
    }
}

fn s3_error(context: &str, err: impl std::error::Error) -> AppError {
    AppError::storage(format!("{context}: {}", DisplayErrorContext(&err)))
}

fn presigning(ttl: Duration) -> AppResult<PresigningConfig> {
    PresigningConfig::expires_in(ttl)
        .map_err(|e| AppError::internal(format!("Invalid presign expiry: {e}")))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn backend(&self) -> &str {
        "s3"
    }

    async fn ensure_bucket(&self) -> AppResult<()> {
        self.bucket_ready
            .get_or_try_init(|| self.create_bucket_if_missing())
            .await
            .map(|_| ())
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| s3_error("Failed to upload object", e))?;

        debug!(key, bytes = size, "Stored object");
        Ok(())
    }

    async fn presigned_get(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning(ttl)?)
            .await
            .map_err(|e| s3_error("Failed to presign download", e))?;
        Ok(request.uri().to_string())
    }

    async fn presigned_put(&self, key: &str, ttl: Duration) -> AppResult<PresignedUpload> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning(ttl)?)
            .await
            .map_err(|e| s3_error("Failed to presign upload", e))?;
        Ok(PresignedUpload {
            url: request.uri().to_string(),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("Failed to delete object", e))?;

        debug!(key, "Deleted object");
        Ok(())
    }

    async fn stat(&self, key: &str) -> AppResult<ObjectMeta> {
        let head = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(head) => head,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                return Err(AppError::not_found("Object not found"));
            }
            Err(e) => return Err(s3_error("Failed to stat object", e)),
        };

        Ok(ObjectMeta {
            key: key.to_string(),
            size_bytes: head.content_length().unwrap_or(0).max(0) as u64,
            content_type: head.content_type().map(str::to_string),
            last_modified: head
                .last_modified()
                .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        })
    }
}
