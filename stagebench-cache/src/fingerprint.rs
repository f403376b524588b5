//! Content Fingerprints
//!
//! SHA-256 fingerprints over build inputs and snapshot trees. Directory
//! fingerprints sort files by relative path and separate path from content
//! with a null byte, so directory entry order and traversal order never
//! affect the result. The hashes detect change; nothing treats them as
//! secret.

use crate::CacheError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Fingerprint every regular file under `root`.
///
/// Incorporates each file's root-relative path (with `/` separators) and its
/// byte content, in sorted path order. An empty tree has a stable,
/// non-empty fingerprint.
pub fn fingerprint_directory(root: &Path) -> Result<String, CacheError> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for rel_path in files {
        hasher.update(rel_path.as_bytes());
        hasher.update([0u8]);
        let contents =
            std::fs::read(root.join(&rel_path)).map_err(|e| CacheError::io(root.join(&rel_path), e))?;
        hasher.update(&contents);
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint an ordered list of build input strings.
pub fn fingerprint_build_inputs<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint a single file's bytes.
pub fn fingerprint_file(path: &Path) -> Result<String, CacheError> {
    let contents = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

/// Collect root-relative paths of regular files, recursively.
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), CacheError> {
    for entry in std::fs::read_dir(dir).map_err(|e| CacheError::io(dir, e))? {
        let entry = entry.map_err(|e| CacheError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CacheError::io(&path, e))?;
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            out.push(relative_slash_path(root, &path));
        }
    }
    Ok(())
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel: PathBuf = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_path_buf();
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
