//! Version Scaffolding
//!
//! Creates a new version directory: resolves the source snapshot, copies it
//! (or makes an empty one), writes the hypothesis template and initial
//! metadata, and creates the empty `images/` area.

use crate::model::{VersionMetadata, VersionStatus, load_version_metadata, save_version_metadata};
use crate::{StoreError, utc_now};
use std::path::{Path, PathBuf};
use tracing::info;

/// Create a new staged version under `root/versions/<slug>`.
///
/// `source` is one of `none` (empty snapshot), `baseline` (snapshot of the
/// unique baseline version), or `version:<slug>` (snapshot of an explicit
/// existing version). Returns the new version directory.
pub fn create_version(root: &Path, slug: &str, source: &str) -> Result<PathBuf, StoreError> {
    let versions_dir = root.join("versions");
    std::fs::create_dir_all(&versions_dir).map_err(|e| StoreError::io(&versions_dir, e))?;

    let version_dir = versions_dir.join(slug);
    if version_dir.exists() {
        return Err(StoreError::VersionExists(slug.to_string()));
    }

    let source_snapshot = resolve_source_snapshot(&versions_dir, source)?;
    std::fs::create_dir_all(&version_dir).map_err(|e| StoreError::io(&version_dir, e))?;

    let snapshot_dir = version_dir.join("snapshot");
    match source_snapshot {
        None => {
            std::fs::create_dir(&snapshot_dir).map_err(|e| StoreError::io(&snapshot_dir, e))?;
        }
        Some(src) => copy_tree(&src, &snapshot_dir)?,
    }

    let hypothesis_path = version_dir.join("hypothesis.md");
    std::fs::write(&hypothesis_path, hypothesis_template(source))
        .map_err(|e| StoreError::io(&hypothesis_path, e))?;

    let metadata = VersionMetadata {
        slug: slug.to_string(),
        kind: "generic-service".to_string(),
        status: VersionStatus::Staging,
        parent: source.to_string(),
        created_at: utc_now(),
        source_commit: None,
        notes: None,
        promoted_by_campaign: None,
        promoted_at: None,
        archived_at: None,
    };
    save_version_metadata(&version_dir.join("version.yaml"), &metadata)?;

    let images_dir = version_dir.join("images");
    std::fs::create_dir_all(&images_dir).map_err(|e| StoreError::io(&images_dir, e))?;

    info!(slug, source, "created version");
    Ok(version_dir)
}

/// Find the slug of the unique baseline version under `root/versions/`.
///
/// Fails when zero or more than one version currently has `baseline` status.
pub fn find_baseline_slug(root: &Path) -> Result<String, StoreError> {
    let versions_dir = root.join("versions");
    let mut baseline_slugs = Vec::new();

    for metadata_path in version_metadata_files(&versions_dir)? {
        let metadata = load_version_metadata(&metadata_path)?;
        if metadata.status == VersionStatus::Baseline {
            baseline_slugs.push(metadata.slug);
        }
    }

    baseline_slugs.sort();
    match baseline_slugs.len() {
        0 => Err(StoreError::NoBaseline),
        1 => Ok(baseline_slugs.remove(0)),
        _ => Err(StoreError::MultipleBaselines(baseline_slugs)),
    }
}

/// Enumerate `versions/*/version.yaml` paths, sorted by slug.
///
/// A missing `versions/` directory yields an empty list.
pub(crate) fn version_metadata_files(versions_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut paths = Vec::new();
    let entries = match std::fs::read_dir(versions_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(paths),
        Err(e) => return Err(StoreError::io(versions_dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(versions_dir, e))?;
        let candidate = entry.path().join("version.yaml");
        if candidate.is_file() {
            paths.push(candidate);
        }
    }
    paths.sort();
    Ok(paths)
}

fn resolve_source_snapshot(
    versions_dir: &Path,
    source: &str,
) -> Result<Option<PathBuf>, StoreError> {
    if source == "none" {
        return Ok(None);
    }
    if source == "baseline" {
        let root = versions_dir
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        // The create path reports its own messages, distinct from the
        // promotion workflow's baseline-count errors.
        let baseline_slug = match find_baseline_slug(&root) {
            Ok(slug) => slug,
            Err(StoreError::NoBaseline) => return Err(StoreError::BaselineMissing),
            Err(StoreError::MultipleBaselines(slugs)) => {
                return Err(StoreError::BaselineAmbiguous(slugs));
            }
            Err(e) => return Err(e),
        };
        return Ok(Some(versions_dir.join(baseline_slug).join("snapshot")));
    }
    if let Some(source_slug) = source.strip_prefix("version:") {
        let source_snapshot = versions_dir.join(source_slug).join("snapshot");
        if !source_snapshot.is_dir() {
            return Err(StoreError::SourceVersionNotFound(source_slug.to_string()));
        }
        return Ok(Some(source_snapshot));
    }
    Err(StoreError::UnsupportedSource(source.to_string()))
}

/// Recursively copy a directory tree. Symlinks are not followed.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dst).map_err(|e| StoreError::io(dst, e))?;
    for entry in std::fs::read_dir(src).map_err(|e| StoreError::io(src, e))? {
        let entry = entry.map_err(|e| StoreError::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| StoreError::io(&from, e))?;
        if file_type.is_dir() {
            copy_tree(&from, &to)?;
        } else if file_type.is_file() {
            std::fs::copy(&from, &to).map_err(|e| StoreError::io(&from, e))?;
        }
    }
    Ok(())
}

fn hypothesis_template(parent: &str) -> String {
    format!(
        "# Hypothesis\n\n\
         ## Context\n\n\
         Describe why this version exists and what scenario it targets.\n\n\
         ## Differences from parent\n\n\
         - Parent source: `{parent}`\n\
         - List concrete implementation differences.\n\n\
         ## Hypotheses\n\n\
         - Hypothesis 1:\n\n\
         ## Risks\n\n\
         - Risk 1:\n\n\
         ## Expected impact\n\n\
         - Metric impact expectations:\n"
    )
}
