use std::io;
use std::process::ExitStatus;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised before the archive response is committed.
///
/// Each variant maps to a plain-text HTTP response. Once headers are on the
/// wire nothing can be reported this way any more; see [`StreamError`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("archive {0} does not exist")]
    NotFound(String),

    #[error("archive producer is unavailable: {0}")]
    DependencyUnavailable(#[source] io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, text) = match &self {
            Self::NotFound(identifier) => {
                tracing::debug!(archive = %identifier, "archive not found");
                (StatusCode::NOT_FOUND, "Archive does not exist")
            }
            Self::DependencyUnavailable(_) => {
                tracing::error!("cannot start archive producer: {self}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Archive service is temporarily unavailable",
                )
            }
            Self::Io(_) => {
                tracing::error!("request failed: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, text).into_response()
    }
}

/// Ways an archive stream can end other than cleanly.
///
/// These happen after the status line has been sent, so they are logged
/// and never turned into responses.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("client disconnected")]
    ClientDisconnected,

    #[error("stream cancelled by the server")]
    Cancelled,

    #[error("archive process exited with {0}")]
    ChildProcessFailure(ExitStatus),

    #[error("failed to read archive output: {0}")]
    Read(#[source] io::Error),
}

impl StreamError {
    /// Whether the client should see the body end in an error rather than
    /// a clean close.
    ///
    /// Only a server-side cancellation does. A failed compressor exit is
    /// logged but otherwise looks like success, since `zip` reports
    /// warnings through its exit code while still writing a valid archive.
    pub fn truncates_body(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
