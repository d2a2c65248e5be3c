use super::staging::{stage_stream, ScratchFile};
use crate::services::{load_owned_video, UrlSigner};
use crate::utils::upload::{ensure_video_mp4, VIDEO_MP4};
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tubely_core::{AppError, ObjectRef, UploadConfig, Video, VideoResponse};
use tubely_db::VideoRepository;
use tubely_processing::{output_path_for, FastStartRemuxer, MediaProber};
use tubely_storage::{derive_video_key, Storage};
use uuid::Uuid;

/// Limits applied to every video upload
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_video_size_bytes: u64,
    /// Directory for staged and remuxed files; system temp dir when `None`
    pub temp_dir: Option<PathBuf>,
    pub upload_timeout: Duration,
}

impl From<&UploadConfig> for UploadSettings {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_video_size_bytes: config.max_video_size_bytes as u64,
            temp_dir: config.temp_dir.clone(),
            upload_timeout: config.upload_timeout,
        }
    }
}

/// The `video` multipart field as received: its declared content type and
/// the body stream.
pub struct IncomingVideo<S> {
    pub content_type: Option<String>,
    pub body: S,
}

#[derive(Clone)]
pub struct VideoUploadService {
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Arc<dyn MediaProber>,
    remuxer: Arc<dyn FastStartRemuxer>,
    signer: UrlSigner,
    settings: UploadSettings,
}

impl VideoUploadService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn FastStartRemuxer>,
        signer: UrlSigner,
        settings: UploadSettings,
    ) -> Self {
        Self {
            videos,
            storage,
            prober,
            remuxer,
            signer,
            settings,
        }
    }

    /// Existence and ownership checks, run before the body is read.
    pub async fn authorize(&self, video_id: Uuid, user_id: Uuid) -> Result<Video, AppError> {
        load_owned_video(self.videos.as_ref(), video_id, user_id).await
    }

    /// Publish the uploaded file as `video`'s content and return the record
    /// with a freshly signed URL.
    ///
    /// The content type is checked before anything touches the disk. All
    /// scratch files are gone by the time this returns, on every path.
    pub async fn ingest<S>(
        &self,
        video: Video,
        incoming: IncomingVideo<S>,
    ) -> Result<VideoResponse, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>> + Send,
    {
        ensure_video_mp4(incoming.content_type.as_deref())?;

        let video_id = video.id;
        let timeout = self.settings.upload_timeout;
        match tokio::time::timeout(timeout, self.publish(video, incoming.body)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    video_id = %video_id,
                    timeout_secs = timeout.as_secs(),
                    "Video upload timed out"
                );
                Err(AppError::Timeout(format!(
                    "Upload for video {} did not finish within {}s",
                    video_id,
                    timeout.as_secs()
                )))
            }
        }
    }

    async fn publish<S>(&self, mut video: Video, body: S) -> Result<VideoResponse, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>> + Send,
    {
        let start = Instant::now();

        let staged = stage_stream(
            body,
            self.settings.temp_dir.as_deref(),
            self.settings.max_video_size_bytes,
        )
        .await?;
        tracing::debug!(
            video_id = %video.id,
            size_bytes = staged.size(),
            path = %staged.path().display(),
            "Upload staged"
        );

        let orientation = self.prober.probe(staged.path()).await?;
        let key = derive_video_key(orientation);
        let bucket = self.storage.bucket().to_string();

        // Cover a partial output left behind by a failed remux as well.
        let mut remuxed = ScratchFile::new(output_path_for(staged.path()));
        let result = self.remuxer.remux(staged.path()).await;
        staged.close();
        remuxed.adopt(result?);

        let stored = self.store(&bucket, &key, remuxed.path()).await;
        drop(remuxed);
        let size_bytes = stored?;

        // Replaces whatever was stored before, readable or not.
        let object = ObjectRef::new(bucket.as_str(), key.as_str())
            .map_err(|e| AppError::Storage(format!("Unusable object reference: {}", e)))?;
        video.video_ref = Some(object.into());
        let updated = self.videos.update(&video).await?;

        tracing::info!(
            video_id = %updated.id,
            user_id = %updated.user_id,
            orientation = %orientation,
            bucket = %bucket,
            key = %key,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_millis(),
            "Video published"
        );

        self.signer.sign_video(updated).await
    }

    async fn store(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, AppError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            AppError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let content_length = file.metadata().await.ok().map(|m| m.len());

        self.storage
            .put_stream(bucket, key, VIDEO_MP4, content_length, Box::pin(file))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}
