use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipstream")]
#[command(version)]
#[command(about = "Serve directories as ZIP archives built on the fly", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipstream --path ./test_photos                 serve every sub-directory as /archive/<name>/\n  \
  zipstream --path ./test_photos --delay 0.5     throttle downloads to one chunk per 0.5s\n  \
  DEBUG=1 PHOTOS_PATH=/srv/photos zipstream      configure through the environment")]
pub struct Cli {
    /// Directory holding one sub-directory per archive
    #[arg(long, env = "PHOTOS_PATH", default_value = "test_photos", value_name = "DIR")]
    pub path: PathBuf,

    /// Delay between chunks, in seconds (fractions allowed)
    #[arg(long, env = "DELAY", default_value_t = 0.0, value_name = "SECS")]
    pub delay: f64,

    /// Enable debug logging
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Address to listen on
    #[arg(long, env = "ZIPSTREAM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "ZIPSTREAM_PORT", default_value_t = 8080)]
    pub port: u16,

    /// HTML page served at `/`
    #[arg(long, env = "ZIPSTREAM_INDEX", default_value = "index.html", value_name = "FILE")]
    pub index: PathBuf,

    /// Chunk size in KiB
    #[arg(
        long,
        env = "ZIPSTREAM_CHUNK_KB",
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub chunk_kb: u32,

    /// Compressor executable (Info-ZIP compatible)
    #[arg(long, env = "ZIPSTREAM_ZIP", default_value = "zip", value_name = "PROGRAM")]
    pub zip_program: PathBuf,
}

impl Cli {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_kb as usize * 1024
    }
}
