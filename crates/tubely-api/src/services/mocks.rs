//! Mock collaborators for service tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tubely_firestore::{FirestoreResult, VideoStore};
use tubely_media::{MediaResult, MediaTool, ProbeReport};
use tubely_models::{VideoId, VideoRecord};
use tubely_storage::{ObjectStore, StorageResult};

mock! {
    pub Storage {}

    #[async_trait]
    impl ObjectStore for Storage {
        async fn put_file(
            &self,
            bucket: &str,
            key: &str,
            path: &Path,
            content_type: &str,
        ) -> StorageResult<()>;

        async fn presign_get(
            &self,
            bucket: &str,
            key: &str,
            expires_in: Duration,
        ) -> StorageResult<String>;
    }
}

mock! {
    pub Media {}

    #[async_trait]
    impl MediaTool for Media {
        async fn probe(&self, path: &Path) -> MediaResult<ProbeReport>;
        async fn rewrite_for_streaming(&self, input: &Path) -> MediaResult<PathBuf>;
        fn check_available(&self) -> MediaResult<()>;
    }
}

mock! {
    pub Videos {}

    #[async_trait]
    impl VideoStore for Videos {
        async fn get(&self, id: &VideoId) -> FirestoreResult<Option<VideoRecord>>;
        async fn set_video_url(&self, id: &VideoId, video_url: &str) -> FirestoreResult<VideoRecord>;
        async fn set_thumbnail_url(
            &self,
            id: &VideoId,
            thumbnail_url: &str,
        ) -> FirestoreResult<VideoRecord>;
    }
}
