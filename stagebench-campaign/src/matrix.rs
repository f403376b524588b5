//! Campaign matrix execution
//!
//! Expands a repetition count and mode list into the deterministic cell
//! sequence `run → mode → (baseline, candidate)` and drives the injected
//! executor through it, persisting one `cell-summary.json` per cell and a
//! `campaign.json` once the whole matrix has completed.

use crate::{CampaignError, ExecutorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metric name to value, deterministically ordered.
pub type MetricsMap = BTreeMap<String, f64>;

/// One scheduled unit of the campaign matrix.
#[derive(Debug, Clone)]
pub struct CampaignCell {
    /// One-based repetition index.
    pub run_index: u32,
    /// Version under measurement.
    pub version_slug: String,
    /// Platform mode of this cell.
    pub platform_mode: String,
    /// `campaigns/<id>/runs/run-NNN`.
    pub run_dir: PathBuf,
    /// `campaigns/<id>/runs/run-NNN/<slug>__<mode>`.
    pub cell_dir: PathBuf,
}

/// Persisted per-cell result (`cell-summary.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellSummary {
    /// One-based repetition index.
    pub run_index: u32,
    /// Version under measurement.
    pub version_slug: String,
    /// Platform mode of this cell.
    pub platform_mode: String,
    /// Flat metric name → value mapping produced by the executor.
    pub metrics: MetricsMap,
}

/// Persisted campaign-level metadata (`campaign.json`), written only after
/// every cell has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMetadata {
    /// Campaign identifier, also the directory name under `campaigns/`.
    pub campaign_id: String,
    /// Source path the benchmark definition was pinned from.
    pub benchmark_path: String,
    /// Fingerprint of the pinned benchmark copy.
    pub benchmark_hash: String,
    /// Repetition count.
    pub runs: u32,
    /// Platform modes, in campaign order.
    pub platform_modes: Vec<String>,
    /// Baseline side of the comparison.
    pub baseline_slug: String,
    /// Candidate side of the comparison.
    pub candidate_slug: String,
    /// Total cells executed (`runs * modes * 2`).
    pub cells_executed: u32,
}

/// In-memory result of a completed campaign.
#[derive(Debug, Clone)]
pub struct CampaignRecord {
    /// The persisted campaign metadata.
    pub metadata: CampaignMetadata,
    /// `campaigns/<id>` under the staging root.
    pub campaign_dir: PathBuf,
}

/// Execute a full campaign matrix.
///
/// The benchmark definition is copied into the campaign directory before any
/// cell runs, and the fingerprint recorded in `campaign.json` is computed
/// over that pinned copy. Cells execute in run-major order; within a run the
/// modes follow `platform_modes` order and the baseline cell always precedes
/// the candidate cell. An executor failure aborts the campaign immediately:
/// summaries already written stay on disk, but no `campaign.json` appears.
#[allow(clippy::too_many_arguments)]
pub fn run_campaign<F>(
    root: &Path,
    campaign_id: &str,
    benchmark_path: &Path,
    baseline_slug: &str,
    candidate_slug: &str,
    runs: u32,
    platform_modes: &[String],
    mut executor: F,
) -> Result<CampaignRecord, CampaignError>
where
    F: FnMut(&CampaignCell) -> Result<MetricsMap, ExecutorError>,
{
    if runs < 1 {
        return Err(CampaignError::InvalidRuns);
    }

    let campaign_dir = root.join("campaigns").join(campaign_id);
    let benchmark_dir = campaign_dir.join("benchmark");
    std::fs::create_dir_all(&benchmark_dir)
        .map_err(|e| CampaignError::io(&benchmark_dir, e))?;

    let pinned = benchmark_dir.join("benchmark.yaml");
    std::fs::copy(benchmark_path, &pinned).map_err(|e| CampaignError::io(benchmark_path, e))?;
    let benchmark_hash = stagebench_cache::fingerprint_file(&pinned)?;

    info!(
        campaign_id,
        baseline = baseline_slug,
        candidate = candidate_slug,
        runs,
        "starting campaign"
    );

    let mut cells_executed = 0u32;
    for run_index in 1..=runs {
        let run_dir = campaign_dir.join("runs").join(format!("run-{run_index:03}"));
        for mode in platform_modes {
            for slug in [baseline_slug, candidate_slug] {
                let cell_dir = run_dir.join(format!("{slug}__{mode}"));
                std::fs::create_dir_all(&cell_dir)
                    .map_err(|e| CampaignError::io(&cell_dir, e))?;

                let cell = CampaignCell {
                    run_index,
                    version_slug: slug.to_string(),
                    platform_mode: mode.clone(),
                    run_dir: run_dir.clone(),
                    cell_dir: cell_dir.clone(),
                };
                debug!(
                    run_index,
                    version_slug = slug,
                    platform_mode = %mode,
                    "executing cell"
                );

                let metrics = executor(&cell).map_err(|e| CampaignError::Executor {
                    run_index,
                    version_slug: slug.to_string(),
                    platform_mode: mode.clone(),
                    source: e,
                })?;

                let summary = CellSummary {
                    run_index,
                    version_slug: slug.to_string(),
                    platform_mode: mode.clone(),
                    metrics,
                };
                write_json(&cell_dir.join("cell-summary.json"), &summary)?;
                cells_executed += 1;
            }
        }
    }

    let metadata = CampaignMetadata {
        campaign_id: campaign_id.to_string(),
        benchmark_path: benchmark_path.display().to_string(),
        benchmark_hash,
        runs,
        platform_modes: platform_modes.to_vec(),
        baseline_slug: baseline_slug.to_string(),
        candidate_slug: candidate_slug.to_string(),
        cells_executed,
    };
    write_json(&campaign_dir.join("campaign.json"), &metadata)?;
    info!(campaign_id, cells_executed, "campaign complete");

    Ok(CampaignRecord {
        metadata,
        campaign_dir,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CampaignError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CampaignError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, text).map_err(|e| CampaignError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging_root() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let benchmark = root.join("benchmark.yaml");
        std::fs::write(&benchmark, "platform_modes: [jvm, native]\n").unwrap();
        (dir, root, benchmark)
    }

    fn fake_metrics(cell: &CampaignCell) -> Result<MetricsMap, ExecutorError> {
        let mut metrics = MetricsMap::new();
        metrics.insert("p95".to_string(), 100.0 + cell.run_index as f64);
        Ok(metrics)
    }

    // Runs count from one; run-000 never exists.
    #[test]
    fn test_cells_execute_in_run_mode_side_order() {
        let (_dir, root, benchmark) = staging_root();
        let modes = vec!["jvm".to_string(), "native".to_string()];
        let mut seen = Vec::new();

        let record = run_campaign(
            &root,
            "camp-1",
            &benchmark,
            "base",
            "cand",
            2,
            &modes,
            |cell| {
                seen.push(format!(
                    "run-{:03}/{}__{}",
                    cell.run_index, cell.version_slug, cell.platform_mode
                ));
                fake_metrics(cell)
            },
        )
        .unwrap();

        assert_eq!(record.metadata.cells_executed, 8);
        assert_eq!(
            seen,
            vec![
                "run-001/base__jvm",
                "run-001/cand__jvm",
                "run-001/base__native",
                "run-001/cand__native",
                "run-002/base__jvm",
                "run-002/cand__jvm",
                "run-002/base__native",
                "run-002/cand__native",
            ]
        );
        assert!(!record.campaign_dir.join("runs/run-000").exists());

        let summary_path = record
            .campaign_dir
            .join("runs/run-002/cand__native/cell-summary.json");
        let summary: CellSummary =
            serde_json::from_str(&std::fs::read_to_string(summary_path).unwrap()).unwrap();
        assert_eq!(summary.run_index, 2);
        assert_eq!(summary.metrics["p95"], 102.0);
    }

    #[test]
    fn test_benchmark_is_pinned_and_hashed_per_campaign() {
        let (_dir, root, benchmark) = staging_root();
        let modes = vec!["jvm".to_string(), "native".to_string()];

        let first = run_campaign(
            &root, "camp-a", &benchmark, "base", "cand", 1, &modes, fake_metrics,
        )
        .unwrap();
        let second = run_campaign(
            &root, "camp-b", &benchmark, "base", "cand", 1, &modes, fake_metrics,
        )
        .unwrap();

        assert!(first.campaign_dir.join("benchmark/benchmark.yaml").is_file());
        assert_eq!(
            first.metadata.benchmark_hash,
            second.metadata.benchmark_hash
        );

        let pinned =
            std::fs::read_to_string(first.campaign_dir.join("benchmark/benchmark.yaml")).unwrap();
        let source = std::fs::read_to_string(&benchmark).unwrap();
        assert_eq!(pinned, source);
    }

    #[test]
    fn test_executor_failure_aborts_without_campaign_json() {
        let (_dir, root, benchmark) = staging_root();
        let modes = vec!["jvm".to_string(), "native".to_string()];

        let err = run_campaign(
            &root,
            "camp-fail",
            &benchmark,
            "base",
            "cand",
            1,
            &modes,
            |cell| {
                if cell.version_slug == "cand" && cell.platform_mode == "native" {
                    return Err("load generator crashed".into());
                }
                fake_metrics(cell)
            },
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "executor failed for cell run-001 cand__native: load generator crashed"
        );

        let campaign_dir = root.join("campaigns/camp-fail");
        assert!(!campaign_dir.join("campaign.json").exists());
        // Cells completed before the failure keep their summaries.
        assert!(campaign_dir
            .join("runs/run-001/base__jvm/cell-summary.json")
            .is_file());
        assert!(campaign_dir
            .join("runs/run-001/base__native/cell-summary.json")
            .is_file());
        assert!(!campaign_dir
            .join("runs/run-001/cand__native/cell-summary.json")
            .exists());
    }

    #[test]
    fn test_zero_runs_rejected() {
        let (_dir, root, benchmark) = staging_root();
        let modes = vec!["jvm".to_string()];
        let err = run_campaign(
            &root, "camp-0", &benchmark, "base", "cand", 0, &modes, fake_metrics,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "runs must be >= 1");
    }
}
