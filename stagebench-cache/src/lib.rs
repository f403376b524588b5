#![warn(missing_docs)]
//! Stagebench Build-Artifact Cache
//!
//! Decides, from content fingerprints and the artifact store's current
//! identity for a reference, whether an image must be rebuilt for a version
//! and platform mode. Fingerprints alone are not sufficient: the backing
//! artifact store can be pruned or retagged out-of-band, so a cache hit is
//! only declared after re-verifying the stored image id against the live
//! store through an injected lookup. That keeps the decision logic itself
//! deterministic and unit-testable.

mod decision;
mod fingerprint;
mod manifest;

pub use decision::{CacheDecision, RebuildReason, evaluate_cache};
pub use fingerprint::{fingerprint_build_inputs, fingerprint_directory, fingerprint_file};
pub use manifest::{ImageManifest, ManifestEntry, load_image_manifest, save_image_manifest};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from cache operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// Filesystem failure while reading a manifest or fingerprinting a tree.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was touching.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file is not valid JSON.
    #[error("Invalid image manifest {path}: {source}")]
    Json {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
