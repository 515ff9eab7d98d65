//! Shared fixtures for API tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use tubely_api::auth::make_jwt;
use tubely_api::{create_router, ApiConfig, AppState};
use tubely_db::{DbError, DbResult, InMemoryVideoRepository, VideoRepository};
use tubely_media::{
    processed_path, GeometryProber, MediaError, MediaResult, PassthroughRepackager, Repackager,
    StaticProber,
};
use tubely_models::{VideoId, VideoRecord};
use tubely_storage::{object_url, KeyGenerator, ObjectStore, StorageError, StorageResult};

pub const SECRET: &str = "integration-test-secret";
pub const BUCKET: &str = "tubely-test";
pub const REGION: &str = "us-east-2";
pub const BOUNDARY: &str = "tubely-boundary";

/// Object store that keeps uploads in memory.
#[derive(Default)]
pub struct RecordingStore {
    pub objects: Mutex<Vec<StoredObject>>,
    pub puts: AtomicUsize,
    pub deletes: Mutex<Vec<String>>,
    pub fail_puts: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RecordingStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_puts.store(true, Ordering::SeqCst);
        store
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_object(&self, key: &str, content_type: &str, mut body: File) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed("bucket unavailable"));
        }

        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes).await?;
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().retain(|o| o.key != key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        object_url(BUCKET, REGION, key)
    }
}

/// Repackager that writes part of its output and then fails, like an ffmpeg
/// run killed midway.
pub struct TruncatingRepackager;

#[async_trait]
impl Repackager for TruncatingRepackager {
    async fn repackage_for_streaming(&self, path: &Path) -> MediaResult<PathBuf> {
        tokio::fs::write(processed_path(path), b"\x00\x00\x00\x18ftyp")
            .await
            .map_err(|e| MediaError::repackage("write failed", e.to_string(), None))?;
        Err(MediaError::repackage(
            "ffmpeg exited",
            "Conversion failed!",
            Some(1),
        ))
    }
}

/// Repository whose writes always fail.
pub struct ReadOnlyRepository {
    pub inner: InMemoryVideoRepository,
}

#[async_trait]
impl VideoRepository for ReadOnlyRepository {
    async fn get_video(&self, id: &VideoId) -> DbResult<VideoRecord> {
        self.inner.get_video(id).await
    }

    async fn update_video(&self, _video: &VideoRecord) -> DbResult<()> {
        Err(DbError::Backend("database is read-only".to_string()))
    }

    async fn create_video(&self, _video: &VideoRecord) -> DbResult<()> {
        Err(DbError::Backend("database is read-only".to_string()))
    }

    async fn list_videos_for_user(&self, user_id: &Uuid) -> DbResult<Vec<VideoRecord>> {
        self.inner.list_videos_for_user(user_id).await
    }
}

/// A router wired to fakes, plus handles for inspecting them.
pub struct TestApp {
    pub router: Router,
    pub videos: Arc<dyn VideoRepository>,
    pub store: Arc<RecordingStore>,
    pub staging: TempDir,
    pub owner: Uuid,
    pub video: VideoRecord,
}

pub struct TestAppBuilder {
    config: ApiConfig,
    store: Arc<RecordingStore>,
    prober: Arc<dyn GeometryProber>,
    repackager: Arc<dyn Repackager>,
    read_only: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            config: ApiConfig {
                jwt_secret: SECRET.to_string(),
                s3_bucket: BUCKET.to_string(),
                s3_region: REGION.to_string(),
                ..ApiConfig::default()
            },
            store: Arc::new(RecordingStore::default()),
            prober: Arc::new(StaticProber::with_dimensions(1920, 1080)),
            repackager: Arc::new(PassthroughRepackager),
            read_only: false,
        }
    }
}

impl TestAppBuilder {
    pub fn prober(mut self, prober: impl GeometryProber + 'static) -> Self {
        self.prober = Arc::new(prober);
        self
    }

    pub fn store(mut self, store: RecordingStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn rollback_on_persist_failure(mut self) -> Self {
        self.config.rollback_on_persist_failure = true;
        self
    }

    pub fn repackager(mut self, repackager: impl Repackager + 'static) -> Self {
        self.repackager = Arc::new(repackager);
        self
    }

    pub fn max_upload_bytes(mut self, limit: usize) -> Self {
        self.config.max_upload_bytes = limit;
        self
    }

    pub fn repackage_for_streaming(mut self) -> Self {
        self.config.repackage_for_streaming = true;
        self
    }

    pub fn build(mut self) -> TestApp {
        let staging = tempfile::tempdir().unwrap();
        self.config.staging_dir = Some(staging.path().to_path_buf());

        let owner = Uuid::new_v4();
        let video = VideoRecord::new(owner, "Boots", "A pair of boots");
        let repo = InMemoryVideoRepository::with_videos([video.clone()]);
        let videos: Arc<dyn VideoRepository> = if self.read_only {
            Arc::new(ReadOnlyRepository { inner: repo })
        } else {
            Arc::new(repo)
        };

        let state = AppState::with_services(
            self.config,
            Arc::clone(&videos),
            self.store.clone(),
            self.prober,
            self.repackager,
            KeyGenerator::default(),
        );

        TestApp {
            router: create_router(state, None),
            videos,
            store: self.store,
            staging,
            owner,
            video,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Files left behind in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    pub async fn stored_video(&self) -> VideoRecord {
        self.videos.get_video(&self.video.id).await.unwrap()
    }
}

pub fn token_for(user_id: Uuid) -> String {
    make_jwt(user_id, SECRET, Duration::from_secs(3600)).unwrap()
}

/// Multipart body with a single file field.
pub fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"boots.mp4\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(video_id: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/video_upload/{}", video_id))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
