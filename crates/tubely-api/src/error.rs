//! API error types.

use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::is_production_env;

pub type ApiResult<T> = Result<T, ApiError>;

/// Request failure, rendered as a JSON error body.
///
/// Every variant carries a short public message and, optionally, the string
/// form of the underlying cause.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        cause: Option<String>,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        cause: Option<String>,
    },

    #[error("Not found: {message}")]
    NotFound {
        message: String,
        cause: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        cause: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            message: msg.into(),
            cause: None,
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: msg.into(),
            cause: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
            cause: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            cause: None,
        }
    }

    /// Attach the underlying failure.
    pub fn with_cause(mut self, err: impl Display) -> Self {
        match &mut self {
            Self::BadRequest { cause, .. }
            | Self::Unauthorized { cause, .. }
            | Self::NotFound { cause, .. }
            | Self::Internal { cause, .. } => *cause = Some(err.to_string()),
        }
        self
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::BadRequest { cause, .. }
            | Self::Unauthorized { cause, .. }
            | Self::NotFound { cause, .. }
            | Self::Internal { cause, .. } => cause.as_deref(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = %status, cause = ?self.cause(), "{}", self.message());
        } else {
            warn!(status = %status, cause = ?self.cause(), "{}", self.message());
        }

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal { .. }
                if is_production_env(&std::env::var("ENVIRONMENT").unwrap_or_default()) =>
            {
                None
            }
            _ => self.cause().map(str::to_string),
        };

        let body = ErrorResponse {
            error: self.message().to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}
