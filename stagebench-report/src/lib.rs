#![warn(missing_docs)]
//! Stagebench Report Aggregator
//!
//! Reads every `cell-summary.json` a campaign produced and condenses them
//! into per-(platform mode, metric) baseline/candidate/delta statistics,
//! emitted as a machine-readable JSON report and a human-readable Markdown
//! table alongside the campaign metadata.

mod aggregate;
mod markdown;

pub use aggregate::{
    AggregateReport, ComparisonRow, StatBlock, aggregate_campaign_reports,
};
pub use markdown::render_markdown;

use std::path::PathBuf;
use thiserror::Error;

/// Errors from report aggregation
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// A campaign file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was touching.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A campaign file is not valid JSON.
    #[error("Invalid campaign file {path}: {source}")]
    Json {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The directory has no `campaign.json`; it is not a campaign.
    #[error("campaign.json not found in {0}")]
    MissingMetadata(PathBuf),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}
