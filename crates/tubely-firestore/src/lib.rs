//! Firestore REST API client.
//!
//! This crate provides:
//! - Document get and masked update over the REST API
//! - Service account authentication via gcp_auth, with token caching
//! - The [`VideoStore`] record store and its Firestore implementation

pub mod client;
pub mod error;
pub mod metrics;
pub mod repos;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use repos::{VideoRepository, VideoStore, VIDEOS_COLLECTION};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
