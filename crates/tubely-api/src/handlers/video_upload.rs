use crate::auth::models::UserContext;
use crate::error::{multipart_error, ErrorResponse, HttpAppError};
use crate::services::IncomingVideo;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tubely_core::{AppError, VideoResponse};
use uuid::Uuid;

const VIDEO_FIELD: &str = "video";

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video published", body = VideoResponse),
        (status = 400, description = "Missing or malformed multipart field", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not an MP4 video", body = ErrorResponse),
        (status = 422, description = "File could not be probed", body = ErrorResponse),
        (status = 502, description = "Object store rejected the upload", body = ErrorResponse),
        (status = 504, description = "Processing timed out", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    tracing::info!(video_id = %video_id, user_id = %user.user_id, "Uploading video");

    let video = state.uploads.authorize(video_id, user.user_id).await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let incoming = IncomingVideo {
            content_type: field.content_type().map(str::to_string),
            body: field.map_err(multipart_error),
        };
        let response = state.uploads.ingest(video, incoming).await?;
        return Ok(Json(response));
    }

    Err(AppError::BadRequest(format!("Missing multipart field '{}'", VIDEO_FIELD)).into())
}
