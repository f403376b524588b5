//! Image Manifest
//!
//! Per-version record of the last successfully built artifact for each
//! platform mode, stored as `images/manifest.json`. Entries are written by a
//! successful build (out of scope here) and read-only to the cache decision.

use crate::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One platform mode's record of the last successful build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Target artifact reference, e.g. `nanofaas/control-plane:opt-v3-jvm`.
    #[serde(default)]
    pub image_ref: String,
    /// Content identity as reported by the artifact store.
    #[serde(default)]
    pub image_id: String,
    /// Hash of the build inputs (mode, module set, source version).
    #[serde(default)]
    pub build_fingerprint: String,
    /// Hash of the version's snapshot tree contents.
    #[serde(default)]
    pub snapshot_fingerprint: String,
}

/// Build cache manifest for one version: platform mode -> entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageManifest {
    /// Per-mode cache entries.
    pub modes: BTreeMap<String, ManifestEntry>,
}

/// Load a manifest; a missing file loads as an empty manifest.
pub fn load_image_manifest(path: &Path) -> Result<ImageManifest, CacheError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ImageManifest::default());
        }
        Err(e) => return Err(CacheError::io(path, e)),
    };
    serde_json::from_str(&text).map_err(|e| CacheError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Persist a manifest, creating parent directories as needed.
pub fn save_image_manifest(path: &Path, manifest: &ImageManifest) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
    }
    let text = serde_json::to_string_pretty(manifest).map_err(|e| CacheError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, text).map_err(|e| CacheError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_manifest_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = load_image_manifest(&dir.path().join("manifest.json")).unwrap();
        assert!(manifest.modes.is_empty());
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images/manifest.json");

        let mut manifest = ImageManifest::default();
        manifest.modes.insert(
            "jvm".to_string(),
            ManifestEntry {
                image_ref: "nanofaas/control-plane:test".to_string(),
                image_id: "sha256:abc".to_string(),
                build_fingerprint: "build-fp".to_string(),
                snapshot_fingerprint: "snapshot-fp".to_string(),
            },
        );

        save_image_manifest(&path, &manifest).unwrap();
        assert_eq!(load_image_manifest(&path).unwrap(), manifest);
    }

    #[test]
    fn test_manifest_without_modes_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{\"images\": []}").unwrap();

        assert!(matches!(
            load_image_manifest(&path),
            Err(CacheError::Json { .. })
        ));
    }
}
