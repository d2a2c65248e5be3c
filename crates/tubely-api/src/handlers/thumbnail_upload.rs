use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::load_owned_video;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::{AppError, VideoResponse};
use uuid::Uuid;

const THUMBNAIL_FIELD: &str = "thumbnail";

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Missing or malformed multipart field", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a JPEG or PNG image", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    tracing::info!(video_id = %video_id, user_id = %user.user_id, "Uploading thumbnail");

    let video = load_owned_video(state.videos.as_ref(), video_id, user.user_id).await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        let response = state
            .thumbnails
            .attach(video, content_type.as_deref(), data)
            .await?;
        return Ok(Json(response));
    }

    Err(AppError::BadRequest(format!("Missing multipart field '{}'", THUMBNAIL_FIELD)).into())
}
