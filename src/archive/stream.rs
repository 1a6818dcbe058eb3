use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;

use super::relay::{RelaySettings, RelayStats, relay};
use super::ArchiveProcess;
use crate::error::StreamError;

/// How long a process that closed its output may take to exit on its own
/// before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// How long to wait for the client to accept the final error item.
const ABORT_GRACE: Duration = Duration::from_secs(5);

/// Response body of one archive download.
///
/// Dropping it (the HTTP server does this when the client goes away)
/// cancels the stream, which kills and reaps the process behind it.
pub struct ArchiveBody {
    // Closed before the guard fires, so the relay sees a disconnect.
    rx: mpsc::Receiver<io::Result<Bytes>>,
    _cancel_on_drop: DropGuard,
}

impl Stream for ArchiveBody {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Start relaying `process` output on a background task.
///
/// `cancel` should be a fresh token for this request, usually a child of
/// the server's shutdown token. The returned body cancels it when dropped.
///
/// The body yields the archive chunks and then ends, also when the
/// compressor exits with a failure status: whatever was sent stands. Only a
/// server shutdown while the client is still reading ends the body with an
/// error, so the response is aborted rather than looking complete.
pub fn spawn_archive_stream(
    process: ArchiveProcess,
    settings: RelaySettings,
    cancel: CancellationToken,
    identifier: &str,
) -> ArchiveBody {
    spawn_with_exit_grace(process, settings, cancel, identifier, EXIT_GRACE)
}

fn spawn_with_exit_grace(
    process: ArchiveProcess,
    settings: RelaySettings,
    cancel: CancellationToken,
    identifier: &str,
    exit_grace: Duration,
) -> ArchiveBody {
    let (tx, rx) = mpsc::channel(1);
    let span = tracing::debug_span!("archive", archive = %identifier, pid = process.id());

    let task = coordinate(process, tx, settings, cancel.clone(), exit_grace);
    tokio::spawn(task.instrument(span));

    ArchiveBody {
        rx,
        _cancel_on_drop: cancel.drop_guard(),
    }
}

/// Run the relay, then tear down in order: kill, reap, close the body.
///
/// This is the only place that cleans up, and it runs once whatever ended
/// the relay.
async fn coordinate(
    mut process: ArchiveProcess,
    tx: mpsc::Sender<io::Result<Bytes>>,
    settings: RelaySettings,
    cancel: CancellationToken,
    exit_grace: Duration,
) {
    let mut stats = RelayStats::default();
    let relayed = match process.take_output() {
        Some(mut output) => relay(&mut output, &tx, &settings, &cancel, &mut stats).await,
        None => Err(StreamError::Read(io::Error::other(
            "archive process has no output pipe",
        ))),
    };

    let outcome = match relayed {
        Ok(()) => finish(&mut process, exit_grace).await,
        Err(err) => {
            tracing::debug!(%err, "killing archive process");
            if let Err(kill_err) = process.kill() {
                tracing::warn!(%kill_err, "failed to kill archive process");
            }
            if let Err(wait_err) = process.wait().await {
                tracing::warn!(%wait_err, "failed to reap archive process");
            }
            Err(err)
        }
    };

    match &outcome {
        Ok(()) => tracing::debug!(chunks = stats.chunks, bytes = stats.bytes, "archive sent"),
        Err(StreamError::ClientDisconnected) => {
            tracing::debug!(bytes = stats.bytes, "client was disconnected")
        }
        Err(err) => tracing::warn!(
            %err,
            bytes = stats.bytes,
            stderr = %process.stderr_tail(),
            "archive stream ended early"
        ),
    }

    if let Err(err) = outcome {
        if err.truncates_body() {
            let item = Err(io::Error::other(err));
            let _ = tokio::time::timeout(ABORT_GRACE, tx.send(item)).await;
        }
    }

    drop(tx);
}

/// Reap a process whose output reached end of stream.
///
/// It gets `exit_grace` to exit by itself before being killed.
async fn finish(process: &mut ArchiveProcess, exit_grace: Duration) -> Result<(), StreamError> {
    let status = match tokio::time::timeout(exit_grace, process.wait()).await {
        Ok(exited) => exited,
        Err(_) => {
            tracing::warn!("archive process lingered after end of output");
            process.kill().map_err(StreamError::Read)?;
            process.wait().await
        }
    }
    .map_err(StreamError::Read)?;

    if status.success() {
        Ok(())
    } else {
        Err(StreamError::ChildProcessFailure(status))
    }
}
