use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore};
use object_store::Result as ObjectResult;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Multipart part size. S3 rejects non-final parts under 5 MiB.
const PART_SIZE_BYTES: usize = 8 * 1024 * 1024;

/// Parts in flight at once; bounds memory to roughly this many parts.
const MAX_PARTS_IN_FLIGHT: usize = 2;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    builder: AmazonS3Builder,
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - Default S3 bucket for new uploads
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment; region and endpoint are explicit.
        let mut builder = AmazonS3Builder::from_env().with_region(region);

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .clone()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            builder,
            store,
            bucket,
        })
    }

    /// Client for `bucket`. References written by an earlier deployment may
    /// name a bucket other than the current default.
    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        if bucket == self.bucket {
            return Ok(self.store.clone());
        }
        self.builder
            .clone()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }
}

/// Copy `reader` to `location` without holding the whole body in memory.
///
/// Bodies smaller than `part_size` go up as a single put; larger ones become
/// a multipart upload, aborted if anything fails midway.
async fn write_stream(
    store: Arc<dyn ObjectStore>,
    location: &Path,
    content_type: &str,
    reader: &mut Pin<Box<dyn AsyncRead + Send + Unpin>>,
    part_size: usize,
) -> StorageResult<u64> {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());

    let mut writer = BufWriter::with_capacity(store, location.clone(), part_size)
        .with_attributes(attributes)
        .with_max_concurrency(MAX_PARTS_IN_FLIGHT);

    let result = match tokio::io::copy(reader, &mut writer).await {
        Ok(size) => writer.shutdown().await.map(|()| size),
        Err(e) => Err(e),
    };

    match result {
        Ok(size) => Ok(size),
        Err(e) => {
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(
                    error = %abort_err,
                    key = %location,
                    "Failed to abort partial upload"
                );
            }
            Err(StorageError::UploadFailed(e.to_string()))
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let store: Arc<dyn ObjectStore> = Arc::new(self.store_for(bucket)?);
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let size = write_stream(store, &location, content_type, &mut reader, PART_SIZE_BYTES)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    expected_bytes = ?content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                e
            })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(size)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self.store_for(bucket)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
