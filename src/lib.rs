//! # zipstream
//!
//! Serve directories as ZIP archives that are streamed to the client while
//! an external compressor is still producing them.
//!
//! Nothing is buffered beyond one chunk: the response body is fed straight
//! from the compressor's standard output, optionally throttled by a delay
//! between chunks. When the client disconnects the compressor is killed and
//! reaped immediately.
//!
//! ## Features
//!
//! - `GET /archive/<identifier>/` streams `<root>/<identifier>` as a ZIP file
//! - Configurable chunk size and per-chunk delay
//! - Path traversal and unknown identifiers are answered with `404`
//! - The compressor never outlives its request, whether the download
//!   completes, the client leaves, or the server shuts down
//! - Static landing page at `/` and a streaming clock at `/uptime`
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use zipstream::{AppState, Cli, Config};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_cli(&Cli::parse())?;
//!     let state = Arc::new(AppState::new(&config, CancellationToken::new()));
//!
//!     let listener = tokio::net::TcpListener::bind(&config.bind).await?;
//!     zipstream::server::serve(listener, state).await
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod server;

pub use archive::{ArchiveProcess, ArchiveProducer, RelaySettings, ZipCommand};
pub use cli::Cli;
pub use config::Config;
pub use error::{AppError, StreamError};
pub use resolver::{DirectoryResolver, SourceDirectory};
pub use server::AppState;
