//! Thumbnail upload handler.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;
use tubely_models::VideoRecord;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_video_id;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Largest accepted thumbnail (10 MiB).
pub const MAX_THUMBNAIL_SIZE: usize = 10 << 20;

/// Media type assumed when the part declares none.
pub const DEFAULT_THUMBNAIL_TYPE: &str = "image/png";

/// Inline `data:` URL for an image.
pub fn thumbnail_data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}

/// Attach a thumbnail to a video record as a data URL.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_video_id(&video_id)?;
    let record = state.uploads.authorize(&video_id, &user.user_id).await?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(DEFAULT_THUMBNAIL_TYPE)
            .to_string();
        let data = field.bytes().await?;
        image = Some((content_type, data));
        break;
    }

    let (content_type, data) = image
        .ok_or_else(|| ApiError::bad_request("Missing multipart field \"thumbnail\""))?;

    if data.len() > MAX_THUMBNAIL_SIZE {
        return Err(ApiError::PayloadTooLarge(format!(
            "thumbnail is {} bytes, limit is {}",
            data.len(),
            MAX_THUMBNAIL_SIZE
        )));
    }

    info!(video_id = %video_id, content_type = %content_type, bytes = data.len(), "Storing thumbnail");

    let updated = state
        .videos
        .set_thumbnail_url(&record.id, &thumbnail_data_url(&content_type, &data))
        .await?;

    Ok(Json(state.playback.sign_if_present(&updated).await?))
}
