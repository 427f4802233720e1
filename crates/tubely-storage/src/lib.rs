//! Object storage for uploaded videos.
//!
//! This crate provides:
//! - The [`ObjectStore`] capability (upload + presigned GET)
//! - An S3 implementation, usable against any S3-compatible endpoint
//! - Storage key derivation from the geometry category

pub mod client;
pub mod error;
pub mod keys;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use keys::{build_storage_key, random_suffix};
pub use store::ObjectStore;
