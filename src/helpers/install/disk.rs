//! Free space checks for the vendor root.

use crate::core::error::{Result, SetupError};
use crate::core::output;
use std::path::Path;
use std::process::Command;

/// Fail unless at least `required_bytes` are free where `path` lives.
///
/// A path that does not exist yet is measured at its nearest existing
/// ancestor. When `df` is unavailable only a warning is printed.
pub fn check_disk_space(path: &Path, required_bytes: u64) -> Result<()> {
    match get_available_space(path) {
        Some(available) if available < required_bytes => {
            Err(SetupError::EnvironmentPreflight(format!(
                "not enough disk space in {}: {} required, {} available",
                path.display(),
                format_bytes(required_bytes),
                format_bytes(available)
            )))
        }
        Some(available) => {
            output::detail(&format!("{} free in {}", format_bytes(available), path.display()));
            Ok(())
        }
        None => {
            output::warning(&format!(
                "could not measure free space in {}; make sure at least {} is available",
                path.display(),
                format_bytes(required_bytes)
            ));
            Ok(())
        }
    }
}

/// Available bytes on the filesystem holding `path`, via `df -k`.
pub fn get_available_space(path: &Path) -> Option<u64> {
    let check_path = path
        .ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;

    let output = Command::new("df").arg("-k").arg(&check_path).output().ok()?;
    if !output.status.success() {
        return None;
    }

    parse_df_available(&String::from_utf8_lossy(&output.stdout))
}

/// Fourth column of the second line of `df -k` output, in bytes.
fn parse_df_available(stdout: &str) -> Option<u64> {
    let line = stdout.lines().nth(1)?;
    let kb = line.split_whitespace().nth(3)?.parse::<u64>().ok()?;
    Some(kb * 1024)
}

/// Human-readable size, e.g. "256.0 MB".
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_disk_space_sufficient() {
        assert!(check_disk_space(Path::new("."), 1).is_ok());
    }

    #[test]
    fn test_check_disk_space_insufficient() {
        let petabyte = 1024u64 * 1024 * 1024 * 1024 * 1024;
        // Only asserts the message when df could measure the space.
        if let Err(e) = check_disk_space(Path::new("."), 10 * petabyte) {
            assert!(matches!(e, SetupError::EnvironmentPreflight(_)));
            assert!(e.to_string().contains("not enough disk space"));
        }
    }

    #[test]
    fn test_nonexistent_vendor_dir_uses_ancestor() {
        let dir = tempdir().unwrap();
        let vendor = dir.path().join("external").join("nested");
        assert!(check_disk_space(&vendor, 1).is_ok());
        assert!(!vendor.exists());
    }

    #[test]
    fn test_parse_df_available() {
        let out = "Filesystem     1K-blocks     Used Available Use% Mounted on\n\
                   /dev/nvme0n1p2 491134256 98765432 367346700  22% /\n";
        assert_eq!(parse_df_available(out), Some(367_346_700 * 1024));
        assert_eq!(parse_df_available("Filesystem\n"), None);
        assert_eq!(parse_df_available(""), None);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(256 * 1024 * 1024), "256.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
