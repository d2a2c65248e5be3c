//! Application state shared by every handler.

use crate::services::{ThumbnailService, UploadSettings, UrlSigner, VideoUploadService};
use std::sync::Arc;
use tubely_core::UploadConfig;
use tubely_db::VideoRepository;
use tubely_processing::{FastStartRemuxer, MediaProber};
use tubely_storage::{LocalStorage, Storage};

#[derive(Clone)]
pub struct AppState {
    pub videos: Arc<dyn VideoRepository>,
    pub signer: UrlSigner,
    pub uploads: VideoUploadService,
    pub thumbnails: ThumbnailService,
    pub upload_config: UploadConfig,
    /// Set when objects live on local disk and are served by this process
    pub local_media: Option<Arc<LocalStorage>>,
}

impl AppState {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn FastStartRemuxer>,
        upload_config: UploadConfig,
        local_media: Option<Arc<LocalStorage>>,
    ) -> Self {
        let signer = UrlSigner::new(storage.clone(), upload_config.presign_ttl);
        let uploads = VideoUploadService::new(
            videos.clone(),
            storage,
            prober,
            remuxer,
            signer.clone(),
            UploadSettings::from(&upload_config),
        );
        let thumbnails = ThumbnailService::new(videos.clone(), signer.clone(), &upload_config);

        Self {
            videos,
            signer,
            uploads,
            thumbnails,
            upload_config,
            local_media,
        }
    }
}
