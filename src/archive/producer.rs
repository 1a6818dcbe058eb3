use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::ArchiveProcess;
use crate::error::AppError;
use crate::resolver::SourceDirectory;

/// Something that can turn a directory into a stream of ZIP bytes.
#[async_trait]
pub trait ArchiveProducer: Send + Sync {
    /// Start producing an archive of `source`.
    ///
    /// Fails with [`AppError::DependencyUnavailable`] if the producer cannot
    /// be started. Nothing has been sent to the client at that point.
    async fn start(&self, source: &SourceDirectory) -> Result<ArchiveProcess, AppError>;
}

/// Produces archives by running Info-ZIP's `zip` against the archive root.
#[derive(Debug, Clone)]
pub struct ZipCommand {
    program: PathBuf,
}

impl ZipCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the command for `source` without spawning it.
    ///
    /// `-q` quiet, `-r` recursive, `-X` no extra attributes (so identical
    /// trees give identical bytes), `-` archive to standard output. The
    /// working directory is the root so entries are `<identifier>/...`.
    pub fn command(&self, source: &SourceDirectory) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["-q", "-r", "-X", "-"])
            .arg(source.identifier())
            .current_dir(source.root());
        command
    }
}

impl Default for ZipCommand {
    fn default() -> Self {
        Self::new("zip")
    }
}

#[async_trait]
impl ArchiveProducer for ZipCommand {
    async fn start(&self, source: &SourceDirectory) -> Result<ArchiveProcess, AppError> {
        ArchiveProcess::spawn(self.command(source)).map_err(AppError::DependencyUnavailable)
    }
}
