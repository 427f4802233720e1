//! Upload coordination.
//!
//! An upload runs strictly in sequence: classify the scratch copy, rewrite it
//! for fast start, derive a storage key, upload, then persist the encoded
//! reference on the video record. Classification failures degrade to
//! [`GeometryCategory::Other`]; every later failure aborts the upload before
//! the record is touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use thiserror::Error;
use tracing::{info, warn};
use tubely_firestore::{FirestoreError, VideoStore};
use tubely_media::{classify_geometry, MediaError, MediaTool};
use tubely_models::{GeometryCategory, ReferenceError, StorageReference, VideoId, VideoRecord};
use tubely_storage::{build_storage_key, ObjectStore, StorageError};

use crate::config::IngestConfig;
use crate::metrics;

/// The only media type accepted for uploads.
pub const UPLOAD_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Video {0} not found")]
    NotFound(VideoId),

    #[error("Video {0} belongs to another user")]
    Forbidden(VideoId),

    #[error("Unsupported media type {0:?}, expected video/mp4")]
    UnsupportedMediaType(String),

    #[error("Upload contains no video file")]
    MissingFile,

    #[error("Scratch file error: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("Fast-start rewrite failed: {0}")]
    Rewrite(#[source] MediaError),

    #[error("Could not generate storage key: {0}")]
    Entropy(#[source] StorageError),

    #[error("Upload to object storage failed: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("Could not encode storage reference: {0}")]
    Encode(#[from] ReferenceError),

    #[error("Video lookup failed: {0}")]
    RecordLookup(#[source] FirestoreError),

    #[error("Video record update failed: {0}")]
    RecordUpdate(#[source] FirestoreError),
}

impl IngestError {
    /// Pipeline stage the error belongs to, for metrics labels.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::Forbidden(_) | Self::RecordLookup(_) => "authorize",
            Self::UnsupportedMediaType(_) | Self::MissingFile => "validate",
            Self::Scratch(_) => "scratch",
            Self::Rewrite(_) => "rewrite",
            Self::Entropy(_) => "key",
            Self::StorageWrite(_) => "upload",
            Self::Encode(_) => "encode",
            Self::RecordUpdate(_) => "persist",
        }
    }
}

/// Check a declared content type, ignoring parameters and case.
pub fn check_media_type(declared: Option<&str>) -> Result<(), IngestError> {
    let raw = declared.unwrap_or_default();
    let essence = raw.split(';').next().unwrap_or_default().trim();

    if essence.eq_ignore_ascii_case(UPLOAD_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(IngestError::UnsupportedMediaType(raw.to_string()))
    }
}

/// Drives a single upload from scratch file to persisted reference.
#[derive(Clone)]
pub struct UploadCoordinator {
    videos: Arc<dyn VideoStore>,
    storage: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaTool>,
    bucket: String,
    scratch_dir: PathBuf,
}

impl UploadCoordinator {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaTool>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            videos,
            storage,
            media,
            bucket: config.bucket.clone(),
            scratch_dir: config.scratch_dir.clone(),
        }
    }

    /// Load the record and verify the caller owns it.
    pub async fn authorize(&self, id: &VideoId, user_id: &str) -> Result<VideoRecord, IngestError> {
        let record = self
            .videos
            .get(id)
            .await
            .map_err(IngestError::RecordLookup)?
            .ok_or(IngestError::NotFound(*id))?;

        if !record.is_owned_by(user_id) {
            warn!(video_id = %id, user_id, "Upload rejected: caller does not own video");
            return Err(IngestError::Forbidden(*id));
        }

        Ok(record)
    }

    /// Fresh per-request scratch directory, removed when dropped.
    pub fn scratch(&self) -> Result<TempDir, IngestError> {
        std::fs::create_dir_all(&self.scratch_dir)?;
        Ok(tempfile::Builder::new()
            .prefix("tubely-upload-")
            .tempdir_in(&self.scratch_dir)?)
    }

    /// Process an uploaded file and persist its storage reference.
    ///
    /// `upload` must live inside a directory from [`scratch`](Self::scratch)
    /// so that intermediate files are cleaned up with it. Only `video_url`
    /// (and `updated_at`) is written; the returned record is the stored one
    /// after that write.
    pub async fn ingest(&self, video_id: &VideoId, upload: &Path) -> Result<VideoRecord, IngestError> {
        let start = Instant::now();

        let result = self.run(video_id, upload).await;

        match &result {
            Ok(updated) => {
                metrics::record_ingest("success", "complete");
                info!(
                    video_id = %video_id,
                    reference = updated.video_url.as_deref().unwrap_or_default(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Video ingested"
                );
            }
            Err(e) => {
                metrics::record_ingest("failure", e.stage());
                warn!(video_id = %video_id, stage = e.stage(), "Video ingest failed: {}", e);
            }
        }

        result
    }

    async fn run(&self, video_id: &VideoId, upload: &Path) -> Result<VideoRecord, IngestError> {
        let category = self.classify(upload).await;
        metrics::record_geometry(category);

        let streamable = self
            .media
            .rewrite_for_streaming(upload)
            .await
            .map_err(IngestError::Rewrite)?;

        let key = build_storage_key(category).map_err(IngestError::Entropy)?;

        let upload_start = Instant::now();
        self.storage
            .put_file(&self.bucket, &key, &streamable, UPLOAD_CONTENT_TYPE)
            .await
            .map_err(IngestError::StorageWrite)?;
        metrics::record_upload_duration(upload_start.elapsed().as_secs_f64());

        let reference = StorageReference::new(self.bucket.as_str(), key)?;

        self.videos
            .set_video_url(video_id, &reference.encode())
            .await
            .map_err(IngestError::RecordUpdate)
    }

    async fn classify(&self, path: &Path) -> GeometryCategory {
        match classify_geometry(self.media.as_ref(), path).await {
            Ok(category) => category,
            Err(e) => {
                warn!(path = %path.display(), "Geometry classification failed, using other: {}", e);
                GeometryCategory::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mocks::{MockMedia, MockStorage, MockVideos};
    use std::sync::Mutex;
    use tubely_media::{ProbeReport, StreamInfo};

    type PutLog = Arc<Mutex<Vec<(String, String, String, PathBuf)>>>;

    fn owned_record() -> VideoRecord {
        VideoRecord::new(VideoId::new(), "owner", "Boots")
    }

    /// What the store returns after the reference write: fields the upload
    /// does not own come from the store, not from the caller.
    fn stored_after_write(id: &VideoId, url: &str) -> VideoRecord {
        VideoRecord::new(*id, "owner", "Boots")
            .with_thumbnail_url("data:image/png;base64,AAAA")
            .with_video_url(url)
    }

    fn report(width: u32, height: u32) -> ProbeReport {
        ProbeReport {
            streams: vec![StreamInfo {
                codec_type: "video".to_string(),
                width: Some(width),
                height: Some(height),
            }],
        }
    }

    fn coordinator(videos: MockVideos, storage: MockStorage, media: MockMedia) -> UploadCoordinator {
        UploadCoordinator::new(
            Arc::new(videos),
            Arc::new(storage),
            Arc::new(media),
            &IngestConfig::new("videos"),
        )
    }

    fn rewriting_media(width: u32, height: u32) -> MockMedia {
        let mut media = MockMedia::new();
        media
            .expect_probe()
            .returning(move |_| Ok(report(width, height)));
        media
            .expect_rewrite_for_streaming()
            .returning(|input| Ok(tubely_media::fast_start_output_path(input)));
        media
    }

    fn logging_storage(log: PutLog) -> MockStorage {
        let mut storage = MockStorage::new();
        storage
            .expect_put_file()
            .times(1)
            .returning(move |bucket, key, path, content_type| {
                log.lock().unwrap().push((
                    bucket.to_string(),
                    key.to_string(),
                    content_type.to_string(),
                    path.to_path_buf(),
                ));
                Ok(())
            });
        storage
    }

    #[test]
    fn test_media_type_check() {
        assert!(check_media_type(Some("video/mp4")).is_ok());
        assert!(check_media_type(Some("Video/MP4; codecs=\"avc1\"")).is_ok());
        assert!(matches!(
            check_media_type(Some("video/quicktime")),
            Err(IngestError::UnsupportedMediaType(_))
        ));
        assert!(check_media_type(Some("")).is_err());
        assert!(check_media_type(None).is_err());
    }

    #[tokio::test]
    async fn test_authorize_missing_record() {
        let mut videos = MockVideos::new();
        videos.expect_get().returning(|_| Ok(None));

        let coordinator = coordinator(videos, MockStorage::new(), MockMedia::new());
        let result = coordinator.authorize(&VideoId::new(), "owner").await;
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_authorize_foreign_record() {
        let record = owned_record();
        let mut videos = MockVideos::new();
        let stored = record.clone();
        videos
            .expect_get()
            .returning(move |_| Ok(Some(stored.clone())));
        videos.expect_set_video_url().never();

        let coordinator = coordinator(videos, MockStorage::new(), MockMedia::new());
        let result = coordinator.authorize(&record.id, "intruder").await;
        assert!(matches!(result, Err(IngestError::Forbidden(id)) if id == record.id));

        let owned = coordinator.authorize(&record.id, "owner").await.unwrap();
        assert_eq!(owned, record);
    }

    #[tokio::test]
    async fn test_ingest_persists_reference() {
        let log: PutLog = Arc::default();
        let mut videos = MockVideos::new();
        videos
            .expect_set_video_url()
            .times(1)
            .returning(|id, url| Ok(stored_after_write(id, url)));

        let coordinator = coordinator(videos, logging_storage(log.clone()), rewriting_media(1920, 1080));
        let upload = PathBuf::from("/scratch/upload.mp4");
        let video_id = VideoId::new();
        let updated = coordinator.ingest(&video_id, &upload).await.unwrap();
        assert_eq!(updated.id, video_id);
        // Response reflects the store, including fields written by others
        assert_eq!(updated.thumbnail_url.as_deref(), Some("data:image/png;base64,AAAA"));

        let puts = log.lock().unwrap();
        let (bucket, key, content_type, path) = &puts[0];
        assert_eq!(bucket, "videos");
        assert!(key.starts_with("landscape/"));
        assert_eq!(content_type, "video/mp4");
        assert_eq!(path, &PathBuf::from("/scratch/upload.mp4.processing"));

        let reference = StorageReference::decode(updated.video_url.as_deref().unwrap()).unwrap();
        assert_eq!(reference.bucket(), "videos");
        assert_eq!(reference.key(), key);
    }

    #[tokio::test]
    async fn test_classification_failure_falls_back_to_other() {
        let log: PutLog = Arc::default();
        let mut videos = MockVideos::new();
        videos
            .expect_set_video_url()
            .times(1)
            .returning(|id, url| Ok(stored_after_write(id, url)));

        let mut media = MockMedia::new();
        media
            .expect_probe()
            .returning(|_| Err(MediaError::NoVideoStream));
        media
            .expect_rewrite_for_streaming()
            .returning(|input| Ok(tubely_media::fast_start_output_path(input)));

        let coordinator = coordinator(videos, logging_storage(log.clone()), media);
        coordinator
            .ingest(&VideoId::new(), Path::new("/scratch/upload.mp4"))
            .await
            .unwrap();

        assert!(log.lock().unwrap()[0].1.starts_with("other/"));
    }

    #[tokio::test]
    async fn test_rewrite_failure_aborts_before_storage() {
        let mut videos = MockVideos::new();
        videos.expect_set_video_url().never();
        let mut storage = MockStorage::new();
        storage.expect_put_file().never();

        let mut media = MockMedia::new();
        media.expect_probe().returning(|_| Ok(report(1080, 1920)));
        media
            .expect_rewrite_for_streaming()
            .returning(|_| Err(MediaError::ffmpeg_failed("moov atom not found", None, Some(1))));

        let result = coordinator(videos, storage, media)
            .ingest(&VideoId::new(), Path::new("/scratch/upload.mp4"))
            .await;
        assert!(matches!(result, Err(IngestError::Rewrite(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_record_untouched() {
        let mut videos = MockVideos::new();
        videos.expect_set_video_url().never();
        let mut storage = MockStorage::new();
        storage
            .expect_put_file()
            .returning(|_, _, _, _| Err(StorageError::upload_failed("access denied")));

        let result = coordinator(videos, storage, rewriting_media(1920, 1080))
            .ingest(&VideoId::new(), Path::new("/scratch/upload.mp4"))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, IngestError::StorageWrite(_)));
        assert_eq!(err.stage(), "upload");
    }

    #[tokio::test]
    async fn test_record_update_failure() {
        let log: PutLog = Arc::default();
        let mut videos = MockVideos::new();
        videos
            .expect_set_video_url()
            .returning(|_, _| Err(FirestoreError::request_failed("deadline exceeded")));

        let result = coordinator(videos, logging_storage(log), rewriting_media(1920, 1080))
            .ingest(&VideoId::new(), Path::new("/scratch/upload.mp4"))
            .await;
        assert!(matches!(result, Err(IngestError::RecordUpdate(_))));
    }

    #[test]
    fn test_scratch_dir_is_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let mut config = IngestConfig::new("videos");
        config.scratch_dir = parent.path().join("nested");

        let coordinator = UploadCoordinator::new(
            Arc::new(MockVideos::new()),
            Arc::new(MockStorage::new()),
            Arc::new(MockMedia::new()),
            &config,
        );

        let scratch = coordinator.scratch().unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(path.join("upload.mp4"), b"data").unwrap();
        std::fs::write(path.join("upload.mp4.processing"), b"data").unwrap();
        assert!(path.starts_with(parent.path()));

        drop(scratch);
        assert!(!path.exists());
    }
}
