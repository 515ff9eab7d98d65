//! Persistence error types.

use thiserror::Error;
use tubely_models::VideoId;

/// Result type for persistence operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors returned by video repositories.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("video not found: {0}")]
    NotFound(VideoId),

    #[error("video already exists: {0}")]
    AlreadyExists(VideoId),

    #[error("backend error: {0}")]
    Backend(String),
}

impl DbError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
