//! Storage key derivation.
//!
//! Keys have the form `<folder>/<suffix>.mp4` where the folder comes from the
//! geometry category and the suffix is random.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use tubely_models::GeometryCategory;

use crate::error::{StorageError, StorageResult};

/// Random bytes per key suffix.
pub const KEY_SUFFIX_BYTES: usize = 16;

/// Extension for every stored video object.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Random URL-safe suffix drawn from the OS CSPRNG.
pub fn random_suffix() -> StorageResult<String> {
    let mut bytes = [0u8; KEY_SUFFIX_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| StorageError::entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Build a fresh object key for a video of the given category.
pub fn build_storage_key(category: GeometryCategory) -> StorageResult<String> {
    Ok(format!(
        "{}/{}.{}",
        category.folder(),
        random_suffix()?,
        VIDEO_EXTENSION
    ))
}
