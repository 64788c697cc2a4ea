//! Ordered fallback across download sources
//!
//! Release hosts and mirrors for these SDKs are occasionally unavailable.
//! Sources are tried first to last; a failed attempt's partial file is
//! removed before the next one starts.

use crate::core::catalog::SourceList;
use crate::core::error::{Result, SetupError};
use crate::core::output;
use std::path::Path;

use super::download::Downloader;
use super::super::internal::{fs_utils, hash};

pub struct FallbackDownloader<'a> {
    downloader: &'a dyn Downloader,
}

impl<'a> FallbackDownloader<'a> {
    pub fn new(downloader: &'a dyn Downloader) -> Self {
        Self { downloader }
    }

    /// Download the first source that works into `dest`.
    ///
    /// When `sha256` is given, a download whose digest does not match counts
    /// as a failed source. Transport, HTTP status and checksum failures move
    /// on to the next source; local I/O errors stop immediately. Returns the
    /// source that succeeded.
    pub fn fetch(&self, sources: &SourceList, dest: &Path, sha256: Option<&str>) -> Result<String> {
        for (attempt, url) in sources.iter().enumerate() {
            output::detail(&format!("downloading {}", url));

            let result = self.downloader.download(url, dest).and_then(|bytes| {
                if let Some(expected) = sha256 {
                    hash::verify_sha256(dest, expected)?;
                }
                Ok(bytes)
            });

            match result {
                Ok(bytes) => {
                    output::detail(&format!("downloaded {} bytes", bytes));
                    return Ok(url.to_string());
                }
                Err(e) => {
                    fs_utils::remove_file_if_exists(dest)?;
                    if !e.is_source_failure() {
                        return Err(e);
                    }
                    if attempt + 1 < sources.len() {
                        output::warning(&format!("{}; trying next source", e));
                    } else {
                        output::warning(&e.to_string());
                    }
                }
            }
        }

        Err(SetupError::AllSourcesExhausted {
            path: dest.to_path_buf(),
            attempts: sources.len(),
        })
    }
}
