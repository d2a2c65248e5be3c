//! Resolves stored object references into expiring URLs.
//!
//! Every read path goes through here; nothing is cached, so each response
//! carries a URL minted for that response.

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tubely_core::{AppError, ObjectRef, Video, VideoResponse};
use tubely_storage::Storage;

#[derive(Clone)]
pub struct UrlSigner {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl UrlSigner {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub async fn sign(&self, object: &ObjectRef) -> Result<String, AppError> {
        self.storage
            .presign_get(&object.bucket, &object.key, self.ttl)
            .await
            .map_err(|e| {
                AppError::Signing(format!("Failed to presign {}: {}", object, e))
            })
    }

    /// Attach a presigned URL to `video`. Records without a stored object
    /// pass through with no URL; an undecodable stored value is a signing
    /// failure.
    pub async fn sign_video(&self, video: Video) -> Result<VideoResponse, AppError> {
        let url = match &video.video_ref {
            Some(stored) => {
                let object = stored.object().map_err(|reason| {
                    AppError::Signing(format!(
                        "Stored video reference for {} is malformed: {}",
                        video.id, reason
                    ))
                })?;
                Some(self.sign(object).await?)
            }
            None => None,
        };
        Ok(VideoResponse::from_video(video, url))
    }

    pub async fn sign_videos(&self, videos: Vec<Video>) -> Result<Vec<VideoResponse>, AppError> {
        try_join_all(videos.into_iter().map(|v| self.sign_video(v))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::pin::Pin;
    use tokio::io::AsyncRead;
    use tubely_core::{StorageBackend, StoredRef};
    use tubely_storage::{StorageError, StorageResult};
    use uuid::Uuid;

    struct FakeStorage {
        fail: bool,
    }

    #[async_trait]
    impl Storage for FakeStorage {
        fn bucket(&self) -> &str {
            "tubely-videos"
        }

        async fn put_stream(
            &self,
            _bucket: &str,
            _key: &str,
            _content_type: &str,
            _content_length: Option<u64>,
            _reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        ) -> StorageResult<u64> {
            unreachable!("signer never uploads")
        }

        async fn presign_get(
            &self,
            bucket: &str,
            key: &str,
            expires_in: Duration,
        ) -> StorageResult<String> {
            if self.fail {
                return Err(StorageError::PresignFailed("credentials expired".into()));
            }
            Ok(format!(
                "https://{}.example/{}?expires_in={}",
                bucket,
                key,
                expires_in.as_secs()
            ))
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    fn signer(fail: bool) -> UrlSigner {
        UrlSigner::new(Arc::new(FakeStorage { fail }), Duration::from_secs(1800))
    }

    fn video_with_ref() -> Video {
        let mut video = Video::new(Uuid::new_v4(), "Boots".into(), String::new());
        video.video_ref = Some(ObjectRef::new("tubely-videos", "landscape/abc.mp4").unwrap().into());
        video
    }

    #[tokio::test]
    async fn test_sign_uses_bucket_key_and_ttl() {
        let url = signer(false)
            .sign(&ObjectRef::new("tubely-videos", "portrait/def.mp4").unwrap())
            .await
            .unwrap();
        assert_eq!(url, "https://tubely-videos.example/portrait/def.mp4?expires_in=1800");
    }

    #[tokio::test]
    async fn test_video_without_reference_passes_through() {
        let video = Video::new(Uuid::new_v4(), "Draft".into(), String::new());
        let response = signer(true).sign_video(video).await.unwrap();
        assert!(response.video_url.is_none());
    }

    #[tokio::test]
    async fn test_presign_failure_is_surfaced() {
        let err = signer(true).sign_video(video_with_ref()).await.unwrap_err();
        assert!(matches!(err, AppError::Signing(_)));
    }

    #[tokio::test]
    async fn test_unreadable_reference_fails_only_when_signed() {
        let mut video = Video::new(Uuid::new_v4(), "Legacy".into(), String::new());
        video.video_ref = Some(StoredRef::parse(
            "https://tubely-videos.s3.us-east-1.amazonaws.com/landscape/abc.mp4",
        ));
        let err = signer(false).sign_video(video).await.unwrap_err();
        match err {
            AppError::Signing(message) => assert!(message.contains("malformed")),
            other => panic!("expected signing failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_videos_signs_each_record() {
        let responses = signer(false)
            .sign_videos(vec![video_with_ref(), video_with_ref()])
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.video_url.is_some()));
    }
}
