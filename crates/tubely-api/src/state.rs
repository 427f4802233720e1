//! Application state.

use std::sync::Arc;

use tubely_firestore::{FirestoreClient, VideoRepository, VideoStore};
use tubely_media::{FfmpegTool, MediaTool};
use tubely_storage::{ObjectStore, S3Client};

use crate::auth::JwtKeys;
use crate::config::{ApiConfig, IngestConfig};
use crate::services::{PresignedLinkIssuer, UploadCoordinator};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub videos: Arc<dyn VideoStore>,
    pub media: Arc<dyn MediaTool>,
    pub jwt: Arc<JwtKeys>,
    pub uploads: UploadCoordinator,
    pub playback: PresignedLinkIssuer,
}

impl AppState {
    /// Build state against the production collaborators.
    pub async fn new(config: ApiConfig, ingest: IngestConfig) -> anyhow::Result<Self> {
        let storage = S3Client::from_env().await?;
        let firestore = FirestoreClient::from_env().await?;

        let mut media = FfmpegTool::new();
        if let Some(secs) = ingest.media_timeout_secs {
            media = media.with_timeout(secs);
        }

        Ok(Self::from_parts(
            config,
            &ingest,
            Arc::new(VideoRepository::new(firestore)),
            Arc::new(storage),
            Arc::new(media),
        ))
    }

    /// Build state from explicit collaborators.
    pub fn from_parts(
        config: ApiConfig,
        ingest: &IngestConfig,
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaTool>,
    ) -> Self {
        let uploads = UploadCoordinator::new(
            Arc::clone(&videos),
            Arc::clone(&storage),
            Arc::clone(&media),
            ingest,
        );
        let playback = PresignedLinkIssuer::new(storage, ingest.playback_url_expiry);
        let jwt = Arc::new(JwtKeys::new(&config.jwt_secret));

        Self {
            config,
            videos,
            media,
            jwt,
            uploads,
            playback,
        }
    }
}
