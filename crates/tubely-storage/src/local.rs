use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncRead;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`. Presigned URLs carry an
/// expiry timestamp and an HMAC-SHA256 signature over bucket, key and expiry;
/// [`LocalStorage::verify`] checks them when the file is served.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
    signing_key: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tubely/media")
    /// * `base_url` - Base URL files are served from (e.g., "http://localhost:8091/media")
    /// * `bucket` - Directory under `base_path` new uploads go to
    /// * `signing_key` - Secret used to sign URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
        signing_key: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let signing_key = signing_key.into();
        if signing_key.is_empty() {
            return Err(StorageError::ConfigError(
                "Local storage signing key must not be empty".to_string(),
            ));
        }

        Ok(LocalStorage {
            base_path,
            base_url,
            bucket,
            signing_key,
        })
    }

    /// Convert bucket and key to a filesystem path, rejecting anything that
    /// could escape the base storage directory.
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        for part in [bucket, key] {
            if part.is_empty()
                || part.starts_with('/')
                || part.contains('\\')
                || part.split('/').any(|segment| segment == ".." || segment == ".")
            {
                return Err(StorageError::InvalidKey(
                    "Storage key contains invalid characters".to_string(),
                ));
            }
        }
        if bucket.contains('/') {
            return Err(StorageError::InvalidKey(
                "Bucket name must not contain '/'".to_string(),
            ));
        }

        Ok(self.base_path.join(bucket).join(key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn signature(&self, bucket: &str, key: &str, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;
        mac.update(bucket.as_bytes());
        mac.update(b"\n");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(&expires.to_be_bytes());
        Ok(mac)
    }

    /// Check a presigned URL's expiry and signature and return the file path.
    pub fn verify(
        &self,
        bucket: &str,
        key: &str,
        expires: u64,
        signature_hex: &str,
    ) -> StorageResult<PathBuf> {
        let path = self.object_path(bucket, key)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > expires {
            return Err(StorageError::PresignFailed("URL has expired".to_string()));
        }

        let signature = hex::decode(signature_hex)
            .map_err(|_| StorageError::PresignFailed("Malformed signature".to_string()))?;
        self.signature(bucket, key, expires)?
            .verify_slice(&signature)
            .map_err(|_| StorageError::PresignFailed("Invalid signature".to_string()))?;

        Ok(path)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(bytes_copied)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.object_path(bucket, key)?;

        let expires = SystemTime::now()
            .checked_add(expires_in)
            .ok_or_else(|| StorageError::PresignFailed("Expiry out of range".to_string()))?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let signature = hex::encode(self.signature(bucket, key, expires)?.finalize().into_bytes());

        Ok(format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url.trim_end_matches('/'),
            bucket,
            key,
            expires,
            signature
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
