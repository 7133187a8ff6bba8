// src/pipeline/hash.rs

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;

use crate::fs::FileSystem;

/// blake3 hex digest of an in-memory buffer.
pub fn content_hash(contents: &[u8]) -> String {
    blake3::hash(contents).to_hex().to_string()
}

/// blake3 hex digest of the file at `path`, or `None` if it is not a file.
pub fn file_hash(fs: &dyn FileSystem, path: &Path) -> Result<Option<String>> {
    if !fs.is_file(path) {
        return Ok(None);
    }

    let mut hasher = Hasher::new();
    let mut file = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("hashing {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Some(hasher.finalize().to_hex().to_string()))
}
