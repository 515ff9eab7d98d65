//! Axum HTTP API server.
//!
//! This crate provides:
//! - The video upload pipeline (`POST /api/video_upload/:video_id`)
//! - Draft video records for uploads to attach to
//! - HS256 bearer token authentication
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, StorageBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::UploadService;
pub use state::AppState;
