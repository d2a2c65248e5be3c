//! Test helpers: build the router over in-memory fakes.
//!
//! Run from workspace root: `cargo test -p tubely-api`. No database, object
//! store or ffmpeg is needed.

#![allow(dead_code)]

pub mod auth;
pub mod fakes;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use fakes::{
    FakeProber, FakeRemuxer, MockStorage, MockVideoRepository, ProbeBehavior, RemuxBehavior,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tubely_api::setup::routes;
use tubely_api::AppState;
use tubely_core::{Config, ServerConfig, StorageBackend, TubelyConfig, UploadConfig, Video};
use uuid::Uuid;

pub const PUBLIC_BASE_URL: &str = "http://localhost:8091";

pub struct TestOptions {
    pub probe: ProbeBehavior,
    pub remux: RemuxBehavior,
    pub fail_put: bool,
    pub fail_presign: bool,
    pub upload_timeout: Duration,
    pub max_video_size_bytes: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            probe: ProbeBehavior::Dimensions(1280, 720),
            remux: RemuxBehavior::Copy,
            fail_put: false,
            fail_presign: false,
            upload_timeout: Duration::from_secs(30),
            max_video_size_bytes: 16 * 1024 * 1024,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub videos: MockVideoRepository,
    pub storage: MockStorage,
    pub prober: FakeProber,
    /// Where staged and remuxed files go
    pub temp_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Insert a draft video owned by `user_id`.
    pub fn seed_video(&self, user_id: Uuid) -> Video {
        let video = Video::new(user_id, "Boots unboxing".to_string(), "Day one".to_string());
        self.videos.insert(video.clone());
        video
    }

    /// Files left behind in the upload temp dir.
    pub fn leftover_temp_files(&self) -> Vec<String> {
        list_dir(self.temp_dir.path())
    }
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("read temp dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().to_string())
        .collect()
}

pub fn test_config(upload: UploadConfig) -> Config {
    Config(Box::new(TubelyConfig {
        base: ServerConfig {
            server_port: 8091,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 5,
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            environment: "test".to_string(),
        },
        database_url: "postgres://unused@localhost/tubely".to_string(),
        storage_backend: Some(StorageBackend::S3),
        s3_bucket: Some(fakes::TEST_BUCKET.to_string()),
        s3_region: Some("us-east-1".to_string()),
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: None,
        local_storage_base_url: None,
        local_storage_signing_key: None,
        upload,
    }))
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(TestOptions::default())
}

pub fn spawn_app_with(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let assets_dir = tempfile::tempdir().expect("assets dir");

    let upload = UploadConfig {
        max_video_size_bytes: options.max_video_size_bytes,
        temp_dir: Some(temp_dir.path().to_path_buf()),
        upload_timeout: options.upload_timeout,
        assets_root: assets_dir.path().to_path_buf(),
        public_base_url: PUBLIC_BASE_URL.to_string(),
        ..UploadConfig::default()
    };
    let config = test_config(upload.clone());

    let videos = MockVideoRepository::default();
    let storage = MockStorage {
        fail_put: options.fail_put,
        fail_presign: options.fail_presign,
        ..MockStorage::default()
    };
    let prober = FakeProber::new(options.probe);
    let remuxer = FakeRemuxer {
        behavior: options.remux,
    };

    let state = Arc::new(AppState::new(
        Arc::new(videos.clone()),
        Arc::new(storage.clone()),
        Arc::new(prober.clone()),
        Arc::new(remuxer),
        upload,
        None,
    ));

    let router = routes::setup_routes(&config, state).expect("router");
    let server = TestServer::new(router.into_make_service()).expect("test server");

    TestApp {
        server,
        videos,
        storage,
        prober,
        temp_dir,
        assets_dir,
    }
}

/// Multipart body with a single file part.
pub fn file_form(field: &str, bytes: &[u8], file_name: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        field,
        Part::bytes(bytes.to_vec())
            .file_name(file_name)
            .mime_type(mime_type),
    )
}

pub fn video_form(bytes: &[u8], mime_type: &str) -> MultipartForm {
    file_form("video", bytes, "boots.mp4", mime_type)
}

/// A few bytes shaped like the start of an MP4; the fakes never decode them.
pub fn sample_mp4() -> Vec<u8> {
    let mut bytes = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom".to_vec();
    bytes.extend(std::iter::repeat(0xAB).take(4096));
    bytes
}
