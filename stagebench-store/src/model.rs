//! Version Metadata Model
//!
//! Structured (de)serialization of `version.yaml` with field validation.
//! Required fields must be present and non-empty; validation errors name the
//! first offending field so operator tooling can branch on cause.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Lifecycle status of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionStatus {
    /// Freshly scaffolded, still being edited.
    Staging,
    /// Ready for comparison campaigns against the baseline.
    Candidate,
    /// The currently promoted reference implementation.
    Baseline,
    /// Evaluated and discarded.
    Rejected,
    /// A former baseline displaced by a promotion.
    ArchivedBaseline,
}

impl VersionStatus {
    /// The kebab-case wire form of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            VersionStatus::Staging => "staging",
            VersionStatus::Candidate => "candidate",
            VersionStatus::Baseline => "baseline",
            VersionStatus::Rejected => "rejected",
            VersionStatus::ArchivedBaseline => "archived-baseline",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staging" => Ok(VersionStatus::Staging),
            "candidate" => Ok(VersionStatus::Candidate),
            "baseline" => Ok(VersionStatus::Baseline),
            "rejected" => Ok(VersionStatus::Rejected),
            "archived-baseline" => Ok(VersionStatus::ArchivedBaseline),
            other => Err(StoreError::UnsupportedStatus(other.to_string())),
        }
    }
}

/// Metadata describing one implementation variant
///
/// Immutable except for status transitions performed by the promotion
/// workflow. Optional fields are omitted from the YAML file when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMetadata {
    /// Unique identifier; also the directory name under `versions/`.
    pub slug: String,
    /// Free-form classification, e.g. `generic-service`.
    pub kind: String,
    /// Current lifecycle status.
    pub status: VersionStatus,
    /// Provenance: `none`, `baseline`, or `version:<slug>`.
    pub parent: String,
    /// Creation time, RFC 3339 UTC at second precision.
    pub created_at: String,
    /// Commit the snapshot was taken from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_commit: Option<String>,
    /// Operator notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Campaign that justified promoting this version to baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_by_campaign: Option<String>,
    /// When this version became the baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<String>,
    /// When this version was displaced as baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
}

/// Raw YAML shape before field validation.
#[derive(Debug, Deserialize)]
struct RawVersionMetadata {
    slug: Option<String>,
    kind: Option<String>,
    status: Option<String>,
    parent: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    source_commit: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    promoted_by_campaign: Option<String>,
    #[serde(default)]
    promoted_at: Option<String>,
    #[serde(default)]
    archived_at: Option<String>,
}

impl RawVersionMetadata {
    fn validate(self) -> Result<VersionMetadata, StoreError> {
        let slug = required("slug", self.slug)?;
        let kind = required("kind", self.kind)?;
        let status = required("status", self.status)?.parse()?;
        let parent = required("parent", self.parent)?;
        let created_at = required("created_at", self.created_at)?;

        Ok(VersionMetadata {
            slug,
            kind,
            status,
            parent,
            created_at,
            source_commit: optional(self.source_commit),
            notes: optional(self.notes),
            promoted_by_campaign: optional(self.promoted_by_campaign),
            promoted_at: optional(self.promoted_at),
            archived_at: optional(self.archived_at),
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, StoreError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StoreError::MissingField(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load and validate a `version.yaml` file.
pub fn load_version_metadata(path: &Path) -> Result<VersionMetadata, StoreError> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let raw: RawVersionMetadata = serde_yaml::from_str(&text).map_err(|e| StoreError::Yaml {
        path: path.to_path_buf(),
        source: e,
    })?;
    raw.validate()
}

/// Persist version metadata with atomic file replacement.
///
/// The YAML is written to a temporary file in the same directory and renamed
/// over the target, so a crash mid-write cannot leave a torn file visible
/// under the real name.
pub fn save_version_metadata(path: &Path, metadata: &VersionMetadata) -> Result<(), StoreError> {
    let text = serde_yaml::to_string(metadata).map_err(|e| StoreError::Yaml {
        path: path.to_path_buf(),
        source: e,
    })?;
    atomic_write(path, text.as_bytes())
}

/// Write bytes to `path` via a same-directory temp file and rename.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    tmp.write_all(contents).map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}
