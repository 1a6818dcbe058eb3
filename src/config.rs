use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

use crate::archive::RelaySettings;
use crate::cli::Cli;

/// Settings read once at start-up and handed to the server as plain values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute path of the directory holding the archives.
    pub root: PathBuf,
    pub relay: RelaySettings,
    pub debug: bool,
    pub bind: String,
    pub index_path: PathBuf,
    pub zip_program: PathBuf,
}

impl Config {
    /// Validate command-line and environment settings.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = std::fs::canonicalize(&cli.path)
            .with_context(|| format!("archive root `{}` does not exist", cli.path.display()))?;
        if !root.is_dir() {
            bail!("archive root `{}` is not a directory", root.display());
        }

        let chunk_delay = Duration::try_from_secs_f64(cli.delay).map_err(|_| {
            anyhow!(
                "invalid delay `{}`: expected a non-negative number of seconds",
                cli.delay
            )
        })?;

        Ok(Self {
            root,
            relay: RelaySettings {
                chunk_size: cli.chunk_size(),
                chunk_delay,
            },
            debug: cli.debug,
            bind: cli.bind_address(),
            index_path: cli.index.clone(),
            zip_program: cli.zip_program.clone(),
        })
    }
}
