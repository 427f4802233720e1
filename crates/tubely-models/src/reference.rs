//! Composite storage reference.
//!
//! A stored video is located by a `(bucket, key)` pair. The pair is persisted
//! in the record's `video_url` field as `"<bucket>,<key>"`. This module is the
//! only place that builds or parses that string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between bucket and key in the persisted form.
pub const REFERENCE_SEPARATOR: char = ',';

/// Result type for reference encoding/decoding.
pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Errors produced by the reference codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Cannot encode reference: {0}")]
    EncodeFailure(String),

    #[error("Malformed storage reference: {0:?}")]
    MalformedReference(String),
}

/// Location of an object in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageReference {
    bucket: String,
    key: String,
}

impl StorageReference {
    /// Create a reference, validating that it can be encoded and decoded back.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> ReferenceResult<Self> {
        let bucket = bucket.into();
        let key = key.into();

        validate_part("bucket", &bucket)?;
        validate_part("key", &key)?;

        Ok(Self { bucket, key })
    }

    /// Bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encode to the persisted `"<bucket>,<key>"` form.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.bucket, REFERENCE_SEPARATOR, self.key)
    }

    /// Decode the persisted form.
    ///
    /// Surrounding whitespace is ignored, on the whole value and on each
    /// segment. Exactly one separator and two non-empty segments are required.
    pub fn decode(raw: &str) -> ReferenceResult<Self> {
        let trimmed = raw.trim();
        let malformed = || ReferenceError::MalformedReference(raw.to_string());

        let mut parts = trimmed.split(REFERENCE_SEPARATOR);
        let (bucket, key) = match (parts.next(), parts.next(), parts.next()) {
            (Some(bucket), Some(key), None) => (bucket.trim(), key.trim()),
            _ => return Err(malformed()),
        };

        if bucket.is_empty() || key.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (String, String) {
        (self.bucket, self.key)
    }
}

/// Encode a bucket/key pair directly.
pub fn encode(bucket: &str, key: &str) -> ReferenceResult<String> {
    StorageReference::new(bucket, key).map(|r| r.encode())
}

/// Decode a persisted reference into its bucket/key pair.
pub fn decode(raw: &str) -> ReferenceResult<(String, String)> {
    StorageReference::decode(raw).map(StorageReference::into_parts)
}

/// Check that objects in `bucket` can be referenced at all.
pub fn validate_bucket(bucket: &str) -> ReferenceResult<()> {
    validate_part("bucket", bucket)
}

fn validate_part(name: &str, value: &str) -> ReferenceResult<()> {
    if value.is_empty() {
        return Err(ReferenceError::EncodeFailure(format!("{} is empty", name)));
    }
    if value.contains(REFERENCE_SEPARATOR) {
        return Err(ReferenceError::EncodeFailure(format!(
            "{} contains '{}'",
            name, REFERENCE_SEPARATOR
        )));
    }
    if value.trim() != value {
        return Err(ReferenceError::EncodeFailure(format!(
            "{} has surrounding whitespace",
            name
        )));
    }
    Ok(())
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StorageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
