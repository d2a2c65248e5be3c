//! Serves objects of the local storage backend behind presigned URLs.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tubely_core::AppError;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: u64,
    pub signature: String,
}

pub async fn serve_local_media(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, HttpAppError> {
    let local = state
        .local_media
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Local media is not enabled".to_string()))?;

    let path = local
        .verify(&bucket, &key, query.expires, &query.signature)
        .map_err(|e| {
            tracing::debug!(bucket = %bucket, key = %key, error = %e, "Rejected media URL");
            AppError::Forbidden("Invalid or expired media URL".to_string())
        })?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| AppError::NotFound(format!("Object {}/{} not found", bucket, key)))?;
    let length = file.metadata().await.map(|m| m.len()).ok();

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("video/mp4"));
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(length));
    }
    Ok(response)
}
