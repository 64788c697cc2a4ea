//! Idempotent zip extraction
//!
//! Entries whose target already exists are left alone, so running the
//! extractor again over a finished destination writes nothing. Each entry is
//! written to a hidden temporary sibling and renamed into place; a killed run
//! never leaves a truncated file at a real target path.

use crate::core::error::{Result, SetupError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::super::internal::progress::{self, ProgressGuard, upgrade_to_bytes};
use super::super::internal::fs_utils;

const COPY_BUFFER: usize = 64 * 1024;

/// One archive entry as listed before extraction starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// What an extraction run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    /// Files written.
    pub written: usize,
    /// Entries whose target already existed.
    pub skipped: usize,
}

pub struct ArchiveExtractor {
    keep_archive: bool,
}

impl ArchiveExtractor {
    pub fn new(keep_archive: bool) -> Self {
        Self { keep_archive }
    }

    /// List every entry's name and uncompressed size.
    pub fn list(&self, archive: &Path) -> Result<Vec<EntryInfo>> {
        let mut zip = open(archive)?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip.by_index(i).map_err(|e| corrupt(archive, e))?;
            entries.push(EntryInfo {
                name: entry.name().to_string(),
                size: entry.size(),
                is_dir: entry.is_dir(),
            });
        }
        Ok(entries)
    }

    /// Expand `archive` into `dest`, skipping entries that already exist,
    /// then delete the archive unless it is being kept. A failed extraction
    /// deletes it too.
    pub fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractReport> {
        let result = self.expand(archive, dest);
        if !self.keep_archive {
            match &result {
                Ok(_) => fs_utils::remove_file_if_exists(archive)?,
                // The extraction error is the one worth reporting.
                Err(_) => {
                    fs_utils::remove_file_if_exists(archive).ok();
                }
            }
        }
        result
    }

    fn expand(&self, archive: &Path, dest: &Path) -> Result<ExtractReport> {
        let entries = self.list(archive)?;
        let total: u64 = entries.iter().map(|e| e.size).sum();

        let name = archive
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive".to_string());
        let pb = progress::create_spinner(&format!("extracting {}", name));
        let _guard = ProgressGuard::new(&pb);
        upgrade_to_bytes(&pb, total);

        std::fs::create_dir_all(dest)?;
        let mut zip = open(archive)?;
        let mut report = ExtractReport::default();

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| corrupt(archive, e))?;

            // Entries escaping the destination are never written.
            let Some(relative) = entry.enclosed_name() else {
                continue;
            };
            let target = dest.join(relative);

            if std::fs::symlink_metadata(&target).is_ok() {
                report.skipped += 1;
                pb.inc(entry.size());
                continue;
            }

            if entry.is_dir() {
                std::fs::create_dir_all(&target)?;
                continue;
            }

            let mode = entry.unix_mode();
            write_entry(&mut entry, &target, archive)?;
            set_mode(&target, mode);

            report.written += 1;
            pb.inc(entry.size());
        }

        Ok(report)
    }
}

fn open(archive: &Path) -> Result<zip::ZipArchive<File>> {
    let file = File::open(archive).map_err(|e| SetupError::ArchiveCorrupt {
        path: archive.to_path_buf(),
        message: format!("cannot open: {}", e),
    })?;
    zip::ZipArchive::new(file).map_err(|e| corrupt(archive, e))
}

fn corrupt(archive: &Path, e: impl std::fmt::Display) -> SetupError {
    SetupError::ArchiveCorrupt {
        path: archive.to_path_buf(),
        message: e.to_string(),
    }
}

/// Write one entry through a temporary sibling, then rename it onto `target`.
fn write_entry(entry: &mut impl Read, target: &Path, archive: &Path) -> Result<()> {
    let parent = target.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);
    std::fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".vendor-setup-")
        .suffix(".part")
        .tempfile_in(&parent)?;

    let mut buffer = vec![0u8; COPY_BUFFER];
    loop {
        // Read failures come from the archive; write failures from the disk.
        let n = entry.read(&mut buffer).map_err(|e| corrupt(archive, e))?;
        if n == 0 {
            break;
        }
        tmp.write_all(&buffer[..n])?;
    }
    tmp.flush()?;

    tmp.persist(target).map_err(|e| SetupError::Io(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(target: &Path, mode: Option<u32>) {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        std::fs::set_permissions(target, std::fs::Permissions::from_mode(mode)).ok();
    }
}

#[cfg(not(unix))]
fn set_mode(_target: &Path, _mode: Option<u32>) {}
