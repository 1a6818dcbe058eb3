use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

/// How much of the child's standard error is kept for diagnostics.
const STDERR_TAIL_LEN: usize = 4096;

/// A running compressor owned by exactly one archive request.
///
/// Standard output is handed to the relay through [`take_output`]. Standard
/// error is drained by a background task so the child never stalls on a
/// full pipe; its last few kilobytes are kept for logging.
///
/// The child is spawned with `kill_on_drop`, so even an owner that never
/// reaches [`kill`]/[`wait`] does not leave the process running.
///
/// [`take_output`]: ArchiveProcess::take_output
/// [`kill`]: ArchiveProcess::kill
/// [`wait`]: ArchiveProcess::wait
pub struct ArchiveProcess {
    child: Child,
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    stderr_tail: Vec<u8>,
    status: Option<ExitStatus>,
}

impl ArchiveProcess {
    /// Spawn `command` with piped output.
    ///
    /// Any stdio configuration already on `command` is overridden.
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take().map(|pipe| tokio::spawn(drain(pipe)));

        Ok(Self {
            child,
            pid,
            stdout,
            stderr,
            stderr_tail: Vec::new(),
            status: None,
        })
    }

    /// OS process id, as observed at spawn time.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Take the readable end of the child's standard output.
    ///
    /// Returns `None` once taken.
    pub fn take_output(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Forcefully terminate the process.
    ///
    /// Killing a process that has already exited, or killing twice, is a
    /// no-op. This only delivers the signal; call [`wait`](Self::wait) to
    /// reap the process.
    pub fn kill(&mut self) -> io::Result<()> {
        if self.status.is_some() {
            return Ok(());
        }

        if let Some(status) = self.child.try_wait()? {
            self.status = Some(status);
            return Ok(());
        }

        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Reaped between the two calls.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Wait for the process to exit and release every handle it holds.
    ///
    /// The exit status is cached, so calling this again returns at once.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = match self.status {
            Some(status) => status,
            None => {
                let status = self.child.wait().await?;
                self.status = Some(status);
                status
            }
        };

        self.stdout.take();
        if let Some(drain) = self.stderr.take() {
            match drain.await {
                Ok(tail) => self.stderr_tail = tail,
                Err(err) => tracing::warn!(%err, "stderr drain task failed"),
            }
        }

        Ok(status)
    }

    /// Exit status, if the process has been reaped.
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Tail of the child's standard error, available after [`wait`](Self::wait).
    pub fn stderr_tail(&self) -> String {
        String::from_utf8_lossy(&self.stderr_tail).trim().to_string()
    }
}

/// Read `pipe` to the end, keeping only the last [`STDERR_TAIL_LEN`] bytes.
async fn drain(mut pipe: ChildStderr) -> Vec<u8> {
    let mut tail = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        match pipe.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > STDERR_TAIL_LEN {
                    tail.drain(..tail.len() - STDERR_TAIL_LEN);
                }
            }
        }
    }

    tail
}
