//! Rebuild Decision
//!
//! First-match-wins evaluation of whether a cached image can be reused for a
//! (version, platform mode) pair. The live identity re-check against the
//! artifact store is mandatory before declaring a hit; it is injected as a
//! lookup function so the decision itself stays deterministic.

use crate::manifest::{ManifestEntry, load_image_manifest};
use crate::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Why a rebuild is (or is not) required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildReason {
    /// The global force flag was set.
    ForcedAll,
    /// This mode was named in the force set.
    ForcedMode,
    /// The manifest has no entry for this mode.
    ModeMissing,
    /// Stored build fingerprint differs from the requested one.
    BuildFingerprintMismatch,
    /// Stored snapshot fingerprint differs from the requested one.
    SnapshotFingerprintMismatch,
    /// Stored image ref or image id is empty.
    ManifestEntryIncomplete,
    /// The artifact store reports a different identity (or none) for the ref.
    ImageIdMismatch,
    /// All checks passed; the cached image can be reused.
    CacheHit,
}

impl RebuildReason {
    /// The kebab-case wire form of this reason.
    pub fn as_str(self) -> &'static str {
        match self {
            RebuildReason::ForcedAll => "forced-all",
            RebuildReason::ForcedMode => "forced-mode",
            RebuildReason::ModeMissing => "mode-missing",
            RebuildReason::BuildFingerprintMismatch => "build-fingerprint-mismatch",
            RebuildReason::SnapshotFingerprintMismatch => "snapshot-fingerprint-mismatch",
            RebuildReason::ManifestEntryIncomplete => "manifest-entry-incomplete",
            RebuildReason::ImageIdMismatch => "image-id-mismatch",
            RebuildReason::CacheHit => "cache-hit",
        }
    }
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a cache evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDecision {
    /// Whether the image must be rebuilt.
    pub rebuild: bool,
    /// The first check that settled the decision.
    pub reason: RebuildReason,
    /// The matched entry, present only on a cache hit.
    pub entry: Option<ManifestEntry>,
}

impl CacheDecision {
    fn rebuild(reason: RebuildReason) -> Self {
        CacheDecision {
            rebuild: true,
            reason,
            entry: None,
        }
    }
}

/// Decide whether `mode` needs a rebuild for the manifest at `manifest_path`.
///
/// Checks in order: global force, per-mode force, entry presence, build
/// fingerprint, snapshot fingerprint, entry completeness, and finally the
/// live image identity via `image_id_lookup` (`None` means not-found and
/// always mismatches). Only when every check passes is `cache-hit` returned,
/// carrying the matched entry for reuse.
pub fn evaluate_cache<F>(
    manifest_path: &Path,
    mode: &str,
    build_fingerprint: &str,
    snapshot_fingerprint: &str,
    image_id_lookup: F,
    force_all: bool,
    force_modes: &HashSet<String>,
) -> Result<CacheDecision, CacheError>
where
    F: Fn(&str) -> Option<String>,
{
    if force_all {
        return Ok(CacheDecision::rebuild(RebuildReason::ForcedAll));
    }
    if force_modes.contains(mode) {
        return Ok(CacheDecision::rebuild(RebuildReason::ForcedMode));
    }

    let manifest = load_image_manifest(manifest_path)?;
    let Some(entry) = manifest.modes.get(mode) else {
        return Ok(CacheDecision::rebuild(RebuildReason::ModeMissing));
    };

    if entry.build_fingerprint != build_fingerprint {
        return Ok(CacheDecision::rebuild(RebuildReason::BuildFingerprintMismatch));
    }
    if entry.snapshot_fingerprint != snapshot_fingerprint {
        return Ok(CacheDecision::rebuild(
            RebuildReason::SnapshotFingerprintMismatch,
        ));
    }

    let image_ref = entry.image_ref.trim();
    let image_id = entry.image_id.trim();
    if image_ref.is_empty() || image_id.is_empty() {
        return Ok(CacheDecision::rebuild(RebuildReason::ManifestEntryIncomplete));
    }

    // The artifact store is mutable out-of-band (pruned, retagged), so the
    // stored identity must be re-verified before reuse.
    let current_id = image_id_lookup(image_ref);
    if current_id.as_deref() != Some(image_id) {
        debug!(mode, image_ref, "stored image id no longer matches the store");
        return Ok(CacheDecision::rebuild(RebuildReason::ImageIdMismatch));
    }

    Ok(CacheDecision {
        rebuild: false,
        reason: RebuildReason::CacheHit,
        entry: Some(entry.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ImageManifest, save_image_manifest};

    fn write_manifest(dir: &Path, mode: &str, entry: ManifestEntry) -> std::path::PathBuf {
        let path = dir.join("versions/candidate/images/manifest.json");
        let mut manifest = ImageManifest::default();
        manifest.modes.insert(mode.to_string(), entry);
        save_image_manifest(&path, &manifest).unwrap();
        path
    }

    fn good_entry() -> ManifestEntry {
        ManifestEntry {
            image_ref: "nanofaas/control-plane:test".to_string(),
            image_id: "sha256:abc".to_string(),
            build_fingerprint: "build-fp".to_string(),
            snapshot_fingerprint: "snapshot-fp".to_string(),
        }
    }

    fn evaluate(
        path: &Path,
        mode: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CacheDecision {
        evaluate_cache(
            path,
            mode,
            "build-fp",
            "snapshot-fp",
            lookup,
            false,
            &HashSet::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_cache_hit_when_everything_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "jvm", good_entry());

        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert!(!decision.rebuild);
        assert_eq!(decision.reason, RebuildReason::CacheHit);
        assert_eq!(
            decision.entry.unwrap().image_ref,
            "nanofaas/control-plane:test"
        );
    }

    #[test]
    fn test_missing_mode_requires_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "native", good_entry());

        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert!(decision.rebuild);
        assert_eq!(decision.reason, RebuildReason::ModeMissing);
        assert!(decision.entry.is_none());
    }

    #[test]
    fn test_missing_manifest_file_requires_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent/manifest.json");

        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert_eq!(decision.reason, RebuildReason::ModeMissing);
    }

    #[test]
    fn test_each_stored_field_flips_exactly_its_own_reason() {
        let dir = tempfile::tempdir().unwrap();

        let mut entry = good_entry();
        entry.build_fingerprint = "other".to_string();
        let path = write_manifest(dir.path(), "jvm", entry);
        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert_eq!(decision.reason, RebuildReason::BuildFingerprintMismatch);

        let mut entry = good_entry();
        entry.snapshot_fingerprint = "other".to_string();
        let path = write_manifest(dir.path(), "jvm", entry);
        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert_eq!(decision.reason, RebuildReason::SnapshotFingerprintMismatch);

        let mut entry = good_entry();
        entry.image_id = "sha256:stale".to_string();
        let path = write_manifest(dir.path(), "jvm", entry);
        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert_eq!(decision.reason, RebuildReason::ImageIdMismatch);
    }

    #[test]
    fn test_incomplete_entry_requires_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let mut entry = good_entry();
        entry.image_id = String::new();
        let path = write_manifest(dir.path(), "jvm", entry);

        let decision = evaluate(&path, "jvm", |_| Some("sha256:abc".to_string()));
        assert_eq!(decision.reason, RebuildReason::ManifestEntryIncomplete);
    }

    #[test]
    fn test_image_missing_from_store_requires_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "jvm", good_entry());

        let decision = evaluate(&path, "jvm", |_| None);
        assert_eq!(decision.reason, RebuildReason::ImageIdMismatch);
    }

    #[test]
    fn test_force_flags_win_without_touching_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "jvm", good_entry());
        let lookup = |_: &str| Some("sha256:abc".to_string());

        let forced_all = evaluate_cache(
            &path,
            "jvm",
            "build-fp",
            "snapshot-fp",
            lookup,
            true,
            &HashSet::new(),
        )
        .unwrap();
        assert_eq!(forced_all.reason, RebuildReason::ForcedAll);

        let mut modes = HashSet::new();
        modes.insert("jvm".to_string());
        let forced_mode = evaluate_cache(
            &path,
            "jvm",
            "build-fp",
            "snapshot-fp",
            lookup,
            false,
            &modes,
        )
        .unwrap();
        assert_eq!(forced_mode.reason, RebuildReason::ForcedMode);
    }
}
