#![warn(missing_docs)]
//! # Stagebench
//!
//! Staging and campaign engine for controlled A/B performance comparisons
//! between two versions of a service:
//! - **Version Store**: staged version directories with YAML metadata and a
//!   lifecycle from `staging` through `candidate` to `baseline`
//! - **Image Cache**: content fingerprints plus live image-id re-verification
//!   decide rebuild-vs-reuse per platform mode
//! - **Campaign Runner**: deterministic `run → mode → (baseline, candidate)`
//!   matrix with one persisted summary per cell
//! - **Report Aggregator**: per-(mode, metric) baseline/candidate/delta
//!   statistics as JSON and Markdown
//! - **Promotion**: atomic metadata swap keeping exactly one baseline
//!
//! ## Quick Start
//!
//! ```ignore
//! use stagebench::run_campaign;
//!
//! let record = run_campaign(
//!     root, "campaign-1", benchmark_path,
//!     "baseline-v1", "candidate-v2",
//!     10, &modes,
//!     |cell| my_load_generator(cell),
//! )?;
//! stagebench::aggregate_campaign_reports(&record.campaign_dir)?;
//! ```

// Re-export the version store
pub use stagebench_store::{
    StoreError, VersionMetadata, VersionStatus, create_version, find_baseline_slug,
    load_version_metadata, promote_candidate_to_baseline, save_version_metadata,
};

// Re-export the image cache
pub use stagebench_cache::{
    CacheDecision, CacheError, ImageManifest, ManifestEntry, RebuildReason, evaluate_cache,
    fingerprint_build_inputs, fingerprint_directory, fingerprint_file, load_image_manifest,
    save_image_manifest,
};

// Re-export the campaign engine
pub use stagebench_campaign::{
    BenchmarkConfig, BenchmarkError, CampaignCell, CampaignError, CampaignMetadata,
    CampaignRecord, CellSummary, ExecutorError, FunctionProfile, MetricsMap,
    load_benchmark_config, normalize_module_selection, resolve_module_selection, run_campaign,
};

// Re-export reporting
pub use stagebench_report::{
    AggregateReport, ComparisonRow, ReportError, StatBlock, aggregate_campaign_reports,
    render_markdown,
};

/// Run the stagebench CLI harness.
///
/// Call this from a custom driver binary's `main()`:
/// ```ignore
/// fn main() {
///     stagebench::run().unwrap();
/// }
/// ```
pub use stagebench_cli::run;
