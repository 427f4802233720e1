//! Video upload and read handlers.

use std::path::Path as FsPath;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use tubely_models::VideoRecord;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::parse_video_id;
use crate::services::ingest::check_media_type;
use crate::services::IngestError;
use crate::state::AppState;

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

/// Upload a video for an existing record.
///
/// Responds with the updated record, its `video_url` replaced by a signed
/// playback URL.
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_video_id(&video_id)?;
    info!(video_id = %video_id, user_id = %user.user_id, "Uploading video");

    let record = state.uploads.authorize(&video_id, &user.user_id).await?;

    let scratch = state.uploads.scratch()?;
    let upload_path = scratch.path().join("upload.mp4");

    let mut received = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }
        check_media_type(field.content_type())?;
        received = Some(save_field(field, &upload_path).await?);
        break;
    }

    let bytes = received.ok_or(IngestError::MissingFile)?;
    debug!(video_id = %video_id, bytes, "Upload received");

    let updated = state.uploads.ingest(&record.id, &upload_path).await?;
    let signed = state.playback.sign(&updated).await?;

    Ok(Json(signed))
}

/// Fetch a video record owned by the caller, with a signed playback URL.
pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_video_id(&video_id)?;
    let record = state.uploads.authorize(&video_id, &user.user_id).await?;

    Ok(Json(state.playback.sign_if_present(&record).await?))
}

/// Stream a multipart field to a scratch file, returning its size.
async fn save_field(mut field: Field<'_>, path: &FsPath) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(IngestError::Scratch)?;

    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await.map_err(IngestError::Scratch)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(IngestError::Scratch)?;

    Ok(written)
}
