//! In-memory stand-ins for the metadata store, object store and media tools.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tubely_core::{AppError, Orientation, StorageBackend, Video};
use tubely_db::VideoRepository;
use tubely_processing::{output_path_for, FastStartRemuxer, MediaProber, ProbeError, RemuxError};
use tubely_storage::{Storage, StorageError, StorageResult};
use uuid::Uuid;

pub const TEST_BUCKET: &str = "tubely-videos";

#[derive(Clone, Default)]
pub struct MockVideoRepository {
    videos: Arc<Mutex<HashMap<Uuid, Video>>>,
}

impl MockVideoRepository {
    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn stored(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl VideoRepository for MockVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.stored(id))
    }

    async fn update(&self, video: &Video) -> Result<Video, AppError> {
        let mut videos = self.videos.lock().unwrap();
        if !videos.contains_key(&video.id) {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }
        let mut updated = video.clone();
        updated.updated_at = chrono::Utc::now();
        videos.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn create(&self, video: &Video) -> Result<Video, AppError> {
        self.insert(video.clone());
        Ok(video.clone())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let mut videos: Vec<Video> = self
            .videos
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockStorage {
    pub objects: Arc<Mutex<Vec<StoredObject>>>,
    pub presigned: Arc<Mutex<Vec<(String, String, Duration)>>>,
    pub fail_put: bool,
    pub fail_presign: bool,
}

impl MockStorage {
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn presigned(&self) -> Vec<(String, String, Duration)> {
        self.presigned.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn bucket(&self) -> &str {
        TEST_BUCKET
    }

    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        if self.fail_put {
            return Err(StorageError::UploadFailed("access denied".to_string()));
        }
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let size = data.len() as u64;
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(size)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if self.fail_presign {
            return Err(StorageError::PresignFailed("credentials expired".to_string()));
        }
        self.presigned
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), expires_in));
        Ok(format!(
            "https://{}.s3.test/{}?X-Amz-Expires={}&X-Amz-Signature=deadbeef",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ProbeBehavior {
    Dimensions(u32, u32),
    Fail,
    Hang,
}

/// Records every file it was asked to probe, with the bytes it held then.
#[derive(Clone)]
pub struct FakeProber {
    pub behavior: ProbeBehavior,
    pub probed: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
}

impl FakeProber {
    pub fn new(behavior: ProbeBehavior) -> Self {
        Self {
            behavior,
            probed: Arc::default(),
        }
    }

    pub fn probed(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<Orientation, ProbeError> {
        let contents = std::fs::read(path).map_err(ProbeError::Spawn)?;
        self.probed
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents));

        match self.behavior {
            ProbeBehavior::Dimensions(width, height) => Ok(Orientation::classify(width, height)),
            ProbeBehavior::Fail => Err(ProbeError::ToolFailed {
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            }),
            ProbeBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Orientation::Other)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RemuxBehavior {
    /// Copy the source to `<source>.processing`
    Copy,
    /// Fail after writing a truncated output file
    FailWithPartialOutput,
}

#[derive(Clone)]
pub struct FakeRemuxer {
    pub behavior: RemuxBehavior,
}

#[async_trait]
impl FastStartRemuxer for FakeRemuxer {
    async fn remux(&self, source: &Path) -> Result<PathBuf, RemuxError> {
        let output = output_path_for(source);
        match self.behavior {
            RemuxBehavior::Copy => {
                std::fs::copy(source, &output).map_err(RemuxError::Spawn)?;
                Ok(output)
            }
            RemuxBehavior::FailWithPartialOutput => {
                std::fs::write(&output, b"trunc").map_err(RemuxError::Spawn)?;
                Err(RemuxError::ToolFailed {
                    status: "exit status: 1".to_string(),
                    stderr: "moov atom not found".to_string(),
                })
            }
        }
    }
}
