use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use bytes::Bytes;
use futures::StreamExt;

use super::AppState;
use crate::error::AppError;

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let contents = tokio::fs::read_to_string(&state.index_path).await?;
    Ok(Html(contents))
}

/// GET /uptime
///
/// Streams the current time as HTML, one line per interval, until the client
/// leaves or the server shuts down. Browsers render partial HTML, so the page
/// grows while it loads.
pub async fn uptime(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ticker = tokio::time::interval(state.uptime_interval);
    let lines = futures::stream::unfold(ticker, |mut ticker| async move {
        ticker.tick().await;
        let line = format!("{}<br>", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        Some((Ok::<_, Infallible>(Bytes::from(line)), ticker))
    })
    .take_until(state.shutdown.clone().cancelled_owned());

    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(lines),
    )
}
