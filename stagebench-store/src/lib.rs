#![warn(missing_docs)]
//! Stagebench Version Store
//!
//! Persists version metadata (status, lineage, snapshot) on disk under a
//! staging root:
//!
//! ```text
//! versions/<slug>/version.yaml   # metadata
//! versions/<slug>/snapshot/      # copied source tree
//! versions/<slug>/images/        # per-mode build cache manifests
//! ```
//!
//! The store is the leaf dependency of the staging engine: scaffolding
//! creates versions, the promotion workflow flips their statuses, and every
//! status-dependent operation re-derives the "exactly one baseline"
//! invariant by scanning metadata files rather than maintaining a pointer.

mod model;
mod promotion;
mod scaffold;

pub use model::{
    VersionMetadata, VersionStatus, load_version_metadata, save_version_metadata,
};
pub use promotion::promote_candidate_to_baseline;
pub use scaffold::{create_version, find_baseline_slug};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from version store operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Filesystem failure while reading or writing version state.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was touching.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A metadata file could not be parsed as YAML.
    #[error("Invalid metadata file {path}: {source}")]
    Yaml {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A required metadata field is absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The status string is not one of the five allowed values.
    #[error("Unsupported status: {0}")]
    UnsupportedStatus(String),

    /// A version directory with this slug already exists.
    #[error("Version already exists: {0}")]
    VersionExists(String),

    /// The `version:<slug>` source does not name an existing version.
    #[error("Source version not found: {0}")]
    SourceVersionNotFound(String),

    /// The source string is not `none`, `baseline`, or `version:<slug>`.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Scaffolding from `baseline` with no baseline version present.
    #[error("No baseline version found")]
    BaselineMissing,

    /// Scaffolding from `baseline` with more than one baseline version.
    #[error("Multiple baseline versions found: {}", .0.join(", "))]
    BaselineAmbiguous(Vec<String>),

    /// The candidate named for promotion has no metadata file.
    #[error("Candidate version not found: {0}")]
    CandidateNotFound(String),

    /// The promotion target is not in `candidate` status.
    #[error("Version '{0}' must be in 'candidate' status")]
    NotACandidate(String),

    /// No version currently has `baseline` status.
    #[error("Expected exactly one baseline version, found none")]
    NoBaseline,

    /// More than one version currently has `baseline` status.
    #[error("Expected exactly one baseline version, found {}: {}", .0.len(), .0.join(", "))]
    MultipleBaselines(Vec<String>),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Current UTC time as an RFC 3339 string at second precision (`Z` suffix).
pub(crate) fn utc_now() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
