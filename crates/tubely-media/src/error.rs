//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Failures while probing or rewriting an upload.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg binary is not on PATH")]
    FfmpegNotFound,

    #[error("ffprobe binary is not on PATH")]
    FfprobeNotFound,

    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    /// The probe reported no video stream with usable dimensions.
    #[error("no video stream with dimensions")]
    NoVideoStream,

    #[error("input file does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("media process exceeded {0}s and was killed")]
    Timeout(u64),

    #[error("media I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable probe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfprobeFailed {
            message: message.into(),
            stderr,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Captured stderr, if the failing process produced any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { stderr, .. } | MediaError::FfprobeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}
