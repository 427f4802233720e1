//! Object storage capability.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageResult;

/// The two object storage operations the ingest pipeline needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `bucket`/`key` with the given content type.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Issue a time-limited GET URL for `bucket`/`key`.
    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> StorageResult<String>;
}
