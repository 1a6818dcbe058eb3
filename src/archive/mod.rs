//! Streaming of directory archives produced by an external process.
//!
//! ## Architecture
//!
//! The module is organized into four parts:
//!
//! - [`producer`]: the [`ArchiveProducer`] capability and its `zip` implementation
//! - [`process`]: ownership of one running compressor ([`ArchiveProcess`])
//! - [`relay`]: the paced read/write loop between process output and response
//! - [`stream`]: the coordinator that runs the relay and always cleans up
//!
//! ## Lifecycle
//!
//! 1. The producer spawns the compressor with its working directory at the
//!    archive root, so entries are named `<identifier>/...`
//! 2. The coordinator task relays chunks into a bounded channel that backs
//!    the HTTP response body
//! 3. When the relay stops, for any reason, the process is killed if still
//!    running, reaped, and only then is the body closed
//!
//! Dropping the response body (the client went away) cancels the stream;
//! so does cancelling the server's shutdown token.

mod process;
mod producer;
mod relay;
mod stream;

pub use process::ArchiveProcess;
pub use producer::{ArchiveProducer, ZipCommand};
pub use relay::{DEFAULT_CHUNK_SIZE, RelaySettings, RelayStats, relay};
pub use stream::{ArchiveBody, spawn_archive_stream};
