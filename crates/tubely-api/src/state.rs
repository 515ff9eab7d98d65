//! Application state.

use std::sync::Arc;

use tracing::info;

use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_media::{FfmpegRepackager, FfprobeProber, GeometryProber, Repackager};
use tubely_storage::{KeyGenerator, LocalAssetStore, ObjectStore, S3Config, S3Store, StorageResult};

use crate::config::{ApiConfig, StorageBackend};
use crate::services::UploadService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub videos: Arc<dyn VideoRepository>,
    pub store: Arc<dyn ObjectStore>,
    pub uploads: UploadService,
}

impl AppState {
    /// Create application state with the real collaborators.
    pub async fn new(config: ApiConfig) -> StorageResult<Self> {
        let store: Arc<dyn ObjectStore> = match config.storage_backend {
            StorageBackend::S3 => {
                let s3 = S3Store::new(S3Config {
                    bucket: config.s3_bucket.clone(),
                    region: config.s3_region.clone(),
                    endpoint_url: config.s3_endpoint_url.clone(),
                    access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                    secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                })
                .await?;
                info!(bucket = %s3.bucket(), region = %config.s3_region, "Using S3 object store");
                Arc::new(s3)
            }
            StorageBackend::Local => {
                let local = LocalAssetStore::new(&config.assets_root, config.port);
                local.ensure_assets_dir().await?;
                info!(root = %config.assets_root.display(), "Using local asset store");
                Arc::new(local)
            }
        };

        Ok(Self::with_services(
            config.clone(),
            Arc::new(InMemoryVideoRepository::new()),
            store,
            Arc::new(FfprobeProber::new(&config.ffprobe_bin)),
            Arc::new(FfmpegRepackager::new(&config.ffmpeg_bin)),
            KeyGenerator::default(),
        ))
    }

    /// Create application state around explicit collaborators.
    pub fn with_services(
        config: ApiConfig,
        videos: Arc<dyn VideoRepository>,
        store: Arc<dyn ObjectStore>,
        prober: Arc<dyn GeometryProber>,
        repackager: Arc<dyn Repackager>,
        keys: KeyGenerator,
    ) -> Self {
        let uploads = UploadService::new(
            &config,
            Arc::clone(&videos),
            Arc::clone(&store),
            prober,
            repackager,
            keys,
        );

        Self {
            config,
            videos,
            store,
            uploads,
        }
    }
}
