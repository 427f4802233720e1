//! Ingest and playback services.

pub mod ingest;
pub mod playback;

#[cfg(test)]
pub(crate) mod mocks;

pub use ingest::{IngestError, UploadCoordinator};
pub use playback::{PlaybackError, PresignedLinkIssuer};
