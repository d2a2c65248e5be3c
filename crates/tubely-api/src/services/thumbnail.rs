//! Thumbnails are written to the static assets directory and referenced by
//! public URL; they do not go through the object store.

use crate::services::UrlSigner;
use crate::utils::upload::thumbnail_extension;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tubely_core::{AppError, UploadConfig, Video, VideoResponse};
use tubely_db::VideoRepository;
use tubely_storage::random_hex;

#[derive(Clone)]
pub struct ThumbnailService {
    videos: Arc<dyn VideoRepository>,
    signer: UrlSigner,
    assets_root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl ThumbnailService {
    pub fn new(videos: Arc<dyn VideoRepository>, signer: UrlSigner, config: &UploadConfig) -> Self {
        Self {
            videos,
            signer,
            assets_root: config.assets_root.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: config.max_thumbnail_size_bytes,
        }
    }

    /// Store `data` as the thumbnail of `video` and return the updated record.
    pub async fn attach(
        &self,
        mut video: Video,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<VideoResponse, AppError> {
        let extension = thumbnail_extension(content_type)?;

        if data.is_empty() {
            return Err(AppError::BadRequest("Thumbnail is empty".to_string()));
        }
        if data.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Thumbnail exceeds {} bytes",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.assets_root)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create assets directory: {}", e)))?;

        let file_name = format!("{}.{}", random_hex(), extension);
        let path = self.assets_root.join(&file_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write thumbnail: {}", e)))?;

        video.thumbnail_url = Some(format!("{}/assets/{}", self.public_base_url, file_name));
        let updated = match self.videos.update(&video).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %remove_err,
                        "Failed to remove orphaned thumbnail"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            video_id = %updated.id,
            file = %file_name,
            size_bytes = data.len(),
            "Thumbnail stored"
        );

        self.signer.sign_video(updated).await
    }
}
