//! HTTP surface: router, shared state and the serve loop.

mod archive;
mod pages;

pub use archive::content_disposition;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::archive::{ArchiveProducer, RelaySettings, ZipCommand};
use crate::config::Config;
use crate::resolver::DirectoryResolver;

/// Interval between lines of the `/uptime` stream.
pub const UPTIME_INTERVAL: Duration = Duration::from_secs(1);

/// Per-server state shared by every handler. Nothing in it is mutable.
#[derive(Clone)]
pub struct AppState {
    pub resolver: DirectoryResolver,
    pub producer: Arc<dyn ArchiveProducer>,
    pub relay: RelaySettings,
    pub index_path: PathBuf,
    pub uptime_interval: Duration,
    /// Cancelled when the server shuts down; every stream holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: &Config, shutdown: CancellationToken) -> Self {
        Self {
            resolver: DirectoryResolver::new(&config.root),
            producer: Arc::new(ZipCommand::new(&config.zip_program)),
            relay: config.relay.clone(),
            index_path: config.index_path.clone(),
            uptime_interval: UPTIME_INTERVAL,
            shutdown,
        }
    }

    /// Replace the archive producer.
    pub fn with_producer(mut self, producer: Arc<dyn ArchiveProducer>) -> Self {
        self.producer = producer;
        self
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/uptime", get(pages::uptime))
        .route("/archive/{identifier}/", get(archive::get_archive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the state's shutdown token is cancelled.
///
/// In-flight archive streams observe the same token, so they abort and
/// clean up their processes instead of holding the shutdown open.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}
