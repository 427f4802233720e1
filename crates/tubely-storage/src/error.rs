//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object storage is misconfigured: {0}")]
    ConfigError(String),

    #[error("Object upload failed: {0}")]
    UploadFailed(String),

    #[error("Could not sign playback URL: {0}")]
    PresignFailed(String),

    /// The OS random source could not produce key bytes.
    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    #[error("Could not read upload source: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn presign_failed(msg: impl Into<String>) -> Self {
        Self::PresignFailed(msg.into())
    }

    pub fn entropy(msg: impl Into<String>) -> Self {
        Self::Entropy(msg.into())
    }
}
