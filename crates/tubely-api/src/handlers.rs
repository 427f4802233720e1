//! Request handlers.

pub mod health;
pub mod thumbnails;
pub mod videos;

pub use health::*;
pub use thumbnails::*;
pub use videos::*;

use tubely_models::VideoId;

use crate::error::ApiError;

/// Parse a video ID path segment.
pub(crate) fn parse_video_id(raw: &str) -> Result<VideoId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid video ID: {}", raw)))
}
