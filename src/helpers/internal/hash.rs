//! SHA-256 helpers for downloaded artifacts.

use crate::core::error::{Result, SetupError};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the lowercase hex SHA-256 of a file.
pub fn sha256_file(file: &Path) -> Result<String> {
    let mut f = std::fs::File::open(file)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file's SHA-256 against an expected hex digest (case-insensitive).
pub fn verify_sha256(file: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(file)?;
    let expected = expected.trim().to_lowercase();

    if actual != expected {
        return Err(SetupError::ChecksumMismatch {
            path: file.to_path_buf(),
            expected,
            actual,
        });
    }

    Ok(())
}
