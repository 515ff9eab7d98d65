//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or repackaging a staged upload.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    BinaryNotFound(&'static str),

    #[error("ffprobe failed: {message}")]
    ProbeExecution {
        message: String,
        stderr: Option<String>,
    },

    #[error("could not parse ffprobe output: {0}")]
    ProbeParse(#[from] serde_json::Error),

    #[error("no video streams found")]
    NoStream,

    #[error("error processing video: {stderr}, {message}")]
    Repackage {
        message: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a probe execution error.
    pub fn probe_execution(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeExecution {
            message: message.into(),
            stderr,
        }
    }

    /// Create a repackaging error.
    pub fn repackage(
        message: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Repackage {
            message: message.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Diagnostic output captured from the external process, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProbeExecution { stderr, .. } => stderr.as_deref(),
            Self::Repackage { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}
