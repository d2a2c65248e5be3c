//! Domain route groups.

use super::multipart_limit;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Authenticated video routes. The caller applies the auth layer.
pub fn video_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let upload = &state.upload_config;

    Router::new()
        .route(
            "/api/videos",
            post(handlers::video_create::create_video).get(handlers::video_get::list_videos),
        )
        .route("/api/videos/{video_id}", get(handlers::video_get::get_video))
        .route(
            "/api/video_upload/{video_id}",
            post(handlers::video_upload::upload_video)
                .layer(multipart_limit(upload.max_video_size_bytes)),
        )
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(handlers::thumbnail_upload::upload_thumbnail)
                .layer(multipart_limit(upload.max_thumbnail_size_bytes)),
        )
}

/// Presigned reads for the local storage backend. The signature is the credential.
pub fn local_media_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/media/{bucket}/{*key}",
        get(handlers::local_media::serve_local_media),
    )
}
