use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::archive::spawn_archive_stream;
use crate::error::AppError;

/// GET /archive/{identifier}/
///
/// Resolution and process start happen before anything is sent, so their
/// failures still become proper 404/503 responses. After that the status
/// is committed and the body is streamed from the compressor.
pub async fn get_archive(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Response, AppError> {
    let source = state.resolver.resolve(&identifier).await?;
    let process = state.producer.start(&source).await?;
    tracing::debug!(archive = %identifier, pid = process.id(), "streaming archive");

    let body = spawn_archive_stream(
        process,
        state.relay.clone(),
        state.shutdown.child_token(),
        &identifier,
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&identifier)),
    ];
    Ok((headers, Body::from_stream(body)).into_response())
}

/// `Content-Disposition` value offering the archive as a download.
pub fn content_disposition(identifier: &str) -> String {
    format!("attachment; filename=\"photos_{identifier}.zip\"")
}
