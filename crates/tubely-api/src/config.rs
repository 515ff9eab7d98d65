//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Upload body cap (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1 << 30;

/// Configuration loading error.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Where uploaded videos are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// S3 bucket, public URL on amazonaws.com
    S3,
    /// Local assets directory served under `/assets`
    Local,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            other => Err(ConfigError(format!("unknown STORAGE_BACKEND '{}'", other))),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max upload body size
    pub max_upload_bytes: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for access tokens
    pub jwt_secret: String,
    /// Publishing backend
    pub storage_backend: StorageBackend,
    /// S3 bucket
    pub s3_bucket: String,
    /// S3 region
    pub s3_region: String,
    /// Custom S3 endpoint
    pub s3_endpoint_url: Option<String>,
    /// Local assets root
    pub assets_root: PathBuf,
    /// Directory for staged uploads, the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
    /// Delete the uploaded object when the record update fails
    pub rollback_on_persist_failure: bool,
    /// Run the fast-start repackager before publishing
    pub repackage_for_streaming: bool,
    /// ffprobe binary
    pub ffprobe_bin: PathBuf,
    /// ffmpeg binary
    pub ffmpeg_bin: PathBuf,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            cors_origins: vec!["*".to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            environment: "development".to_string(),
            jwt_secret: String::new(),
            storage_backend: StorageBackend::S3,
            s3_bucket: String::new(),
            s3_region: "us-east-2".to_string(),
            s3_endpoint_url: None,
            assets_root: PathBuf::from("./assets"),
            staging_dir: None,
            rollback_on_persist_failure: false,
            repackage_for_streaming: false,
            ffprobe_bin: PathBuf::from("ffprobe"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError("JWT_SECRET must be set".to_string()))?;

        let storage_backend = match std::env::var("STORAGE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let s3_bucket = std::env::var("S3_BUCKET").unwrap_or_default();
        if storage_backend == StorageBackend::S3 && s3_bucket.is_empty() {
            return Err(ConfigError(
                "S3_BUCKET must be set when STORAGE_BACKEND=s3".to_string(),
            ));
        }

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret,
            storage_backend,
            s3_bucket,
            s3_region: std::env::var("S3_REGION").unwrap_or(defaults.s3_region),
            s3_endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
            assets_root: std::env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_root),
            staging_dir: std::env::var("STAGING_DIR").ok().map(PathBuf::from),
            rollback_on_persist_failure: env_flag("ROLLBACK_ON_PERSIST_FAILURE")
                .unwrap_or(defaults.rollback_on_persist_failure),
            repackage_for_streaming: env_flag("REPACKAGE_FOR_STREAMING")
                .unwrap_or(defaults.repackage_for_streaming),
            ffprobe_bin: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_bin),
            ffmpeg_bin: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_bin),
            metrics_enabled: env_flag("METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        is_production_env(&self.environment)
    }
}

/// Whether an `ENVIRONMENT` value names production, ignoring case and padding.
pub fn is_production_env(environment: &str) -> bool {
    environment.trim().eq_ignore_ascii_case("production")
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}
