//! Setup error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing the vendor directory.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("environment check failed: {0}")]
    EnvironmentPreflight(String),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to download {}: all {attempts} source(s) exhausted", .path.display())]
    AllSourcesExhausted { path: PathBuf, attempts: usize },

    #[error("archive {} is corrupt or unreadable: {message}", .path.display())]
    ArchiveCorrupt { path: PathBuf, message: String },

    #[error("package manager command failed: {cmd} (exit code: {code:?})")]
    PackageManager { cmd: String, code: Option<i32> },

    #[error("disk image step failed: {0}")]
    DiskImage(String),

    #[error("sha256 mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{name} is still missing after install (expected {})", .marker.display())]
    MarkerMissing { name: String, marker: PathBuf },

    #[error("installation declined: {0}")]
    ConsentDenied(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SetupError {
    /// Whether this error belongs to a single source attempt, so the next
    /// source in a fallback chain may still succeed.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::ChecksumMismatch { .. }
        )
    }
}

pub type Result<T, E = SetupError> = std::result::Result<T, E>;
