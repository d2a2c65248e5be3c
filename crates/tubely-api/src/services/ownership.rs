use tubely_core::{AppError, Video};
use tubely_db::VideoRepository;
use uuid::Uuid;

/// Load a video the caller is allowed to modify.
///
/// A missing record is `NotFound`; a record owned by someone else is
/// `Forbidden`. The two are never collapsed.
pub async fn load_owned_video(
    videos: &dyn VideoRepository,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<Video, AppError> {
    let video = videos
        .get(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if !video.is_owned_by(user_id) {
        tracing::debug!(video_id = %video_id, user_id = %user_id, "Caller does not own video");
        return Err(AppError::Forbidden(format!(
            "User {} does not own video {}",
            user_id, video_id
        )));
    }

    Ok(video)
}
