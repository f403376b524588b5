#![warn(missing_docs)]
//! Stagebench Campaign Engine
//!
//! Loads the declarative benchmark definition, expands it with a run count
//! into a deterministic matrix of cells, and executes the matrix through an
//! injected executor:
//!
//! ```text
//! benchmark.yaml ──▶ BenchmarkConfig ──▶ run_campaign
//!                                             │ run → mode → (baseline, candidate)
//!                                             ▼
//!                    campaigns/<id>/runs/run-NNN/<slug>__<mode>/cell-summary.json
//! ```
//!
//! The executor owns the expensive side effects (builds, deploys, load
//! generation); this crate only sees an opaque metrics mapping per cell and
//! guarantees the reproducible layout and the pinned benchmark copy.

mod benchmark;
mod matrix;
mod modules;

pub use benchmark::{BenchmarkConfig, FunctionProfile, load_benchmark_config};
pub use matrix::{
    CampaignCell, CampaignMetadata, CampaignRecord, CellSummary, MetricsMap, run_campaign,
};
pub use modules::{normalize_module_selection, resolve_module_selection};

use std::path::PathBuf;
use thiserror::Error;

/// Opaque error from the injected cell executor.
pub type ExecutorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from benchmark definition loading and module selection
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BenchmarkError {
    /// The definition file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was touching.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The definition is not valid YAML.
    #[error("Invalid benchmark definition {path}: {source}")]
    Yaml {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The top level of the document is not a mapping.
    #[error("benchmark.yaml must be a mapping")]
    NotAMapping,

    /// `function_profile` is neither `all` nor `subset`.
    #[error("Unsupported function_profile: {0}")]
    UnsupportedProfile(String),

    /// `function_profile: subset` without a non-empty `functions` list.
    #[error("functions must be a non-empty list when function_profile=subset")]
    EmptyFunctions,

    /// `platform_modes` is missing, empty, or not a list.
    #[error("platform_modes must be a non-empty list")]
    EmptyPlatformModes,

    /// `platform_modes` lacks one of the two compared modes.
    #[error("platform_modes must include jvm and native")]
    MissingRequiredMode,

    /// A selected module is not in the available set.
    #[error("unknown modules: {0}")]
    UnknownModules(String),

    /// A module's declared dependency is not in the available set.
    #[error("module '{module}' depends on missing module '{dependency}'")]
    MissingModuleDependency {
        /// Module whose dependency list is broken.
        module: String,
        /// The absent dependency.
        dependency: String,
    },
}

/// Errors from campaign execution
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CampaignError {
    /// Filesystem failure while laying out the campaign directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was touching.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A summary or metadata file could not be serialized.
    #[error("Failed to encode {path}: {source}")]
    Json {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The requested repetition count is zero.
    #[error("runs must be >= 1")]
    InvalidRuns,

    /// Hashing the pinned benchmark copy failed.
    #[error(transparent)]
    Fingerprint(#[from] stagebench_cache::CacheError),

    /// The injected executor failed; the campaign aborts immediately.
    #[error("executor failed for cell run-{run_index:03} {version_slug}__{platform_mode}: {source}")]
    Executor {
        /// Run index of the failing cell.
        run_index: u32,
        /// Version the cell was measuring.
        version_slug: String,
        /// Platform mode of the cell.
        platform_mode: String,
        /// Collaborator error.
        #[source]
        source: ExecutorError,
    },
}

impl CampaignError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CampaignError::Io {
            path: path.into(),
            source,
        }
    }
}
