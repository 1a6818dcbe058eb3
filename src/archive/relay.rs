use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;

/// Default chunk size: 100 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 100 * 1024;

/// Per-request pacing of the relay loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Largest chunk read from the producer in one go.
    pub chunk_size: usize,
    /// Pause after each chunk is handed to the response. Zero disables pacing.
    pub chunk_delay: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: Duration::ZERO,
        }
    }
}

/// What a relay run has forwarded so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub chunks: u64,
    pub bytes: u64,
}

/// Pump `reader` into `tx` until end of stream.
///
/// Each iteration reads at most `chunk_size` bytes, forwards them, then
/// sleeps for `chunk_delay`. Only a zero-length read ends the stream; short
/// reads are forwarded as they are.
///
/// Every suspension point (read, send, pacing) also watches `cancel` and the
/// receiving side of `tx`. A closed receiver is reported as
/// [`StreamError::ClientDisconnected`], a cancelled token with the receiver
/// still open as [`StreamError::Cancelled`].
pub async fn relay<R>(
    reader: &mut R,
    tx: &mpsc::Sender<io::Result<Bytes>>,
    settings: &RelaySettings,
    cancel: &CancellationToken,
    stats: &mut RelayStats,
) -> Result<(), StreamError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; settings.chunk_size.max(1)];

    loop {
        let n = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(interrupted(tx)),
            _ = tx.closed() => return Err(StreamError::ClientDisconnected),
            read = reader.read(&mut buf) => read.map_err(StreamError::Read)?,
        };

        if n == 0 {
            return Ok(());
        }

        let chunk = Bytes::copy_from_slice(&buf[..n]);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(interrupted(tx)),
            sent = tx.send(Ok(chunk)) => {
                sent.map_err(|_| StreamError::ClientDisconnected)?;
            }
        }

        stats.chunks += 1;
        stats.bytes += n as u64;
        tracing::trace!(chunk = stats.chunks, len = n, "sent archive chunk");

        if !settings.chunk_delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(interrupted(tx)),
                _ = tx.closed() => return Err(StreamError::ClientDisconnected),
                _ = tokio::time::sleep(settings.chunk_delay) => {}
            }
        }
    }
}

fn interrupted(tx: &mpsc::Sender<io::Result<Bytes>>) -> StreamError {
    if tx.is_closed() {
        StreamError::ClientDisconnected
    } else {
        StreamError::Cancelled
    }
}
