use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::load_owned_video;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tubely_core::VideoResponse;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = VideoResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Video URL could not be signed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %user.user_id, video_id = %video_id, operation = "get_video")
)]
pub async fn get_video(
    user: UserContext,
    Path(video_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = load_owned_video(state.videos.as_ref(), video_id, user.user_id).await?;
    let response = state.signer.sign_video(video).await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Caller's videos, newest first", body = Vec<VideoResponse>),
        (status = 500, description = "A video URL could not be signed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "list_videos"))]
pub async fn list_videos(
    user: UserContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let videos = state.videos.list_for_user(user.user_id).await?;
    let responses = state.signer.sign_videos(videos).await?;

    Ok(Json(responses))
}
