//! Playback link issuing.
//!
//! Stored records carry an encoded storage reference in `video_url`. Readers
//! get a copy of the record whose `video_url` is a short-lived presigned GET
//! URL; the stored record is never modified.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use tubely_models::{ReferenceError, StorageReference, VideoRecord};
use tubely_storage::{ObjectStore, StorageError};

use crate::metrics;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Video has no stored reference")]
    MissingReference,

    #[error(transparent)]
    MalformedReference(#[from] ReferenceError),

    #[error("Failed to sign playback URL: {0}")]
    Signing(#[source] StorageError),
}

/// Turns stored references into signed playback URLs at read time.
#[derive(Clone)]
pub struct PresignedLinkIssuer {
    storage: Arc<dyn ObjectStore>,
    expiry: Duration,
}

impl PresignedLinkIssuer {
    pub fn new(storage: Arc<dyn ObjectStore>, expiry: Duration) -> Self {
        Self { storage, expiry }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Return a copy of `record` with `video_url` replaced by a signed URL.
    pub async fn sign(&self, record: &VideoRecord) -> Result<VideoRecord, PlaybackError> {
        let raw = record
            .video_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(PlaybackError::MissingReference)?;

        let reference = StorageReference::decode(raw).inspect_err(|_| {
            metrics::record_playback_link("malformed");
        })?;

        let url = self
            .storage
            .presign_get(reference.bucket(), reference.key(), self.expiry)
            .await
            .map_err(|e| {
                metrics::record_playback_link("signing_failed");
                PlaybackError::Signing(e)
            })?;

        debug!(video_id = %record.id, key = reference.key(), "Issued playback URL");
        metrics::record_playback_link("issued");

        let mut signed = record.clone();
        signed.video_url = Some(url);
        Ok(signed)
    }

    /// Like [`sign`](Self::sign), but records without media pass through
    /// unchanged.
    pub async fn sign_if_present(&self, record: &VideoRecord) -> Result<VideoRecord, PlaybackError> {
        match self.sign(record).await {
            Err(PlaybackError::MissingReference) => Ok(record.clone()),
            other => other,
        }
    }
}
