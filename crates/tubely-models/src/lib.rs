//! Shared data models for the Tubely backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their identifiers
//! - Geometry categories used to partition stored videos
//! - The composite storage reference and its codec

pub mod geometry;
pub mod reference;
pub mod video;

// Re-export common types
pub use geometry::GeometryCategory;
pub use reference::{validate_bucket, ReferenceError, ReferenceResult, StorageReference};
pub use video::{VideoId, VideoRecord};
