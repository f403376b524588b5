//! Campaign aggregation
//!
//! Statistics are computed on the raw per-cell values; each side's stats are
//! rounded to 4 decimals first and the deltas are taken between the rounded
//! sides, so the emitted numbers are mutually consistent.

use crate::markdown::render_markdown;
use crate::ReportError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use stagebench_campaign::{CampaignMetadata, CellSummary};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Canonical metric order for report rows.
const METRIC_ORDER: [&str; 6] = [
    "p95",
    "p99",
    "fail_rate",
    "throughput",
    "heap_peak",
    "gc_pause",
];

/// Summary statistics for one side of a comparison, rounded to 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Median of the raw values.
    pub median: f64,
    /// Mean of the raw values.
    pub mean: f64,
    /// Minimum observed value.
    pub min: f64,
    /// Maximum observed value.
    pub max: f64,
}

/// One aggregated `(platform mode, metric)` comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Platform mode the row covers.
    pub platform_mode: String,
    /// Metric name.
    pub metric: String,
    /// Baseline-side statistics.
    pub baseline: StatBlock,
    /// Candidate-side statistics.
    pub candidate: StatBlock,
    /// Candidate minus baseline, per statistic.
    pub delta: StatBlock,
    /// Number of baseline values aggregated.
    pub baseline_samples: usize,
    /// Number of candidate values aggregated.
    pub candidate_samples: usize,
}

/// The full aggregate report (`aggregate-comparison.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Campaign the report was aggregated from.
    pub campaign_id: String,
    /// Baseline side of the comparison.
    pub baseline_slug: String,
    /// Candidate side of the comparison.
    pub candidate_slug: String,
    /// Rows in mode-major, canonical-metric order.
    pub rows: Vec<ComparisonRow>,
}

/// Aggregate every cell summary under a campaign directory.
///
/// The baseline and candidate slugs come from `campaign.json`; the platform
/// mode set comes from the cells actually observed on disk, sorted, so a
/// partially-completed campaign aggregates cleanly. Pairs where either side
/// produced no values are skipped. The report is written next to
/// `campaign.json` as `aggregate-comparison.json` and
/// `aggregate-comparison.md` and also returned.
pub fn aggregate_campaign_reports(campaign_dir: &Path) -> Result<AggregateReport, ReportError> {
    let metadata_path = campaign_dir.join("campaign.json");
    if !metadata_path.is_file() {
        return Err(ReportError::MissingMetadata(campaign_dir.to_path_buf()));
    }
    let metadata: CampaignMetadata = read_json(&metadata_path)?;

    let summaries = collect_cell_summaries(&campaign_dir.join("runs"))?;
    let modes: BTreeSet<&str> = summaries.iter().map(|s| s.platform_mode.as_str()).collect();

    let pairs: Vec<(&str, &str)> = modes
        .iter()
        .flat_map(|mode| METRIC_ORDER.iter().map(move |metric| (*mode, *metric)))
        .collect();

    let rows: Vec<ComparisonRow> = pairs
        .par_iter()
        .filter_map(|&(mode, metric)| {
            let baseline = metric_values(&summaries, mode, &metadata.baseline_slug, metric);
            let candidate = metric_values(&summaries, mode, &metadata.candidate_slug, metric);
            if baseline.is_empty() || candidate.is_empty() {
                return None;
            }
            let baseline_block = stat_block(&baseline);
            let candidate_block = stat_block(&candidate);
            Some(ComparisonRow {
                platform_mode: mode.to_string(),
                metric: metric.to_string(),
                baseline: baseline_block,
                candidate: candidate_block,
                delta: delta_block(baseline_block, candidate_block),
                baseline_samples: baseline.len(),
                candidate_samples: candidate.len(),
            })
        })
        .collect();

    let report = AggregateReport {
        campaign_id: metadata.campaign_id,
        baseline_slug: metadata.baseline_slug,
        candidate_slug: metadata.candidate_slug,
        rows,
    };

    let json_path = campaign_dir.join("aggregate-comparison.json");
    let text = serde_json::to_string_pretty(&report).map_err(|e| ReportError::Json {
        path: json_path.clone(),
        source: e,
    })?;
    std::fs::write(&json_path, text).map_err(|e| ReportError::io(&json_path, e))?;

    let md_path = campaign_dir.join("aggregate-comparison.md");
    std::fs::write(&md_path, render_markdown(&report)).map_err(|e| ReportError::io(&md_path, e))?;

    info!(
        campaign_id = %report.campaign_id,
        rows = report.rows.len(),
        "aggregated campaign"
    );
    Ok(report)
}

/// All `cell-summary.json` files under `runs/run-*/<cell>/`, in path order.
fn collect_cell_summaries(runs_dir: &Path) -> Result<Vec<CellSummary>, ReportError> {
    let mut summaries = Vec::new();
    for run_dir in sorted_subdirs(runs_dir)? {
        for cell_dir in sorted_subdirs(&run_dir)? {
            let summary_path = cell_dir.join("cell-summary.json");
            if summary_path.is_file() {
                summaries.push(read_json(&summary_path)?);
            }
        }
    }
    Ok(summaries)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ReportError::io(dir, e)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ReportError> {
    let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| ReportError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

fn metric_values(summaries: &[CellSummary], mode: &str, slug: &str, metric: &str) -> Vec<f64> {
    summaries
        .iter()
        .filter(|s| s.platform_mode == mode && s.version_slug == slug)
        .filter_map(|s| s.metrics.get(metric).copied())
        .collect()
}

fn stat_block(values: &[f64]) -> StatBlock {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    StatBlock {
        median: round4(median_of_sorted(&sorted)),
        mean: round4(sorted.iter().sum::<f64>() / sorted.len() as f64),
        min: round4(sorted[0]),
        max: round4(sorted[sorted.len() - 1]),
    }
}

fn delta_block(baseline: StatBlock, candidate: StatBlock) -> StatBlock {
    StatBlock {
        median: round4(candidate.median - baseline.median),
        mean: round4(candidate.mean - baseline.mean),
        min: round4(candidate.min - baseline.min),
        max: round4(candidate.max - baseline.max),
    }
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagebench_campaign::MetricsMap;

    fn write_cell(
        campaign_dir: &Path,
        run_index: u32,
        slug: &str,
        mode: &str,
        metrics: &[(&str, f64)],
    ) {
        let cell_dir = campaign_dir
            .join("runs")
            .join(format!("run-{run_index:03}"))
            .join(format!("{slug}__{mode}"));
        std::fs::create_dir_all(&cell_dir).unwrap();
        let summary = CellSummary {
            run_index,
            version_slug: slug.to_string(),
            platform_mode: mode.to_string(),
            metrics: metrics
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<MetricsMap>(),
        };
        std::fs::write(
            cell_dir.join("cell-summary.json"),
            serde_json::to_string_pretty(&summary).unwrap(),
        )
        .unwrap();
    }

    fn write_campaign_json(campaign_dir: &Path, modes: &[&str]) {
        let metadata = CampaignMetadata {
            campaign_id: "camp-1".to_string(),
            benchmark_path: "benchmark.yaml".to_string(),
            benchmark_hash: "deadbeef".to_string(),
            runs: 2,
            platform_modes: modes.iter().map(|m| m.to_string()).collect(),
            baseline_slug: "base".to_string(),
            candidate_slug: "cand".to_string(),
            cells_executed: 0,
        };
        std::fs::create_dir_all(campaign_dir).unwrap();
        std::fs::write(
            campaign_dir.join("campaign.json"),
            serde_json::to_string_pretty(&metadata).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_median_and_delta_from_two_runs() {
        let dir = tempfile::tempdir().unwrap();
        let campaign_dir = dir.path().join("campaigns/camp-1");
        write_campaign_json(&campaign_dir, &["jvm", "native"]);
        write_cell(&campaign_dir, 1, "base", "jvm", &[("p95", 120.0)]);
        write_cell(&campaign_dir, 2, "base", "jvm", &[("p95", 140.0)]);
        write_cell(&campaign_dir, 1, "cand", "jvm", &[("p95", 100.0)]);
        write_cell(&campaign_dir, 2, "cand", "jvm", &[("p95", 110.0)]);

        let report = aggregate_campaign_reports(&campaign_dir).unwrap();
        assert_eq!(report.rows.len(), 1);

        let row = &report.rows[0];
        assert_eq!(row.platform_mode, "jvm");
        assert_eq!(row.metric, "p95");
        assert_eq!(row.baseline.median, 130.0);
        assert_eq!(row.candidate.median, 105.0);
        assert_eq!(row.delta.median, -25.0);
        assert_eq!(row.baseline_samples, 2);

        assert!(campaign_dir.join("aggregate-comparison.json").is_file());
        assert!(campaign_dir.join("aggregate-comparison.md").is_file());
    }

    #[test]
    fn test_rows_follow_canonical_metric_order() {
        let dir = tempfile::tempdir().unwrap();
        let campaign_dir = dir.path().join("campaigns/camp-1");
        write_campaign_json(&campaign_dir, &["jvm"]);
        let metrics: &[(&str, f64)] = &[
            ("gc_pause", 1.0),
            ("p95", 2.0),
            ("throughput", 3.0),
            ("fail_rate", 0.0),
        ];
        write_cell(&campaign_dir, 1, "base", "jvm", metrics);
        write_cell(&campaign_dir, 1, "cand", "jvm", metrics);

        let report = aggregate_campaign_reports(&campaign_dir).unwrap();
        let order: Vec<&str> = report.rows.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(order, vec!["p95", "fail_rate", "throughput", "gc_pause"]);
    }

    #[test]
    fn test_modes_come_from_observed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let campaign_dir = dir.path().join("campaigns/camp-1");
        // campaign.json claims both modes, but only native cells exist
        write_campaign_json(&campaign_dir, &["jvm", "native"]);
        write_cell(&campaign_dir, 1, "base", "native", &[("p99", 5.0)]);
        write_cell(&campaign_dir, 1, "cand", "native", &[("p99", 4.0)]);

        let report = aggregate_campaign_reports(&campaign_dir).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].platform_mode, "native");
    }

    #[test]
    fn test_pair_skipped_when_one_side_has_no_values() {
        let dir = tempfile::tempdir().unwrap();
        let campaign_dir = dir.path().join("campaigns/camp-1");
        write_campaign_json(&campaign_dir, &["jvm"]);
        write_cell(&campaign_dir, 1, "base", "jvm", &[("p95", 120.0)]);
        write_cell(&campaign_dir, 1, "cand", "jvm", &[("p99", 90.0)]);

        let report = aggregate_campaign_reports(&campaign_dir).unwrap();
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_stats_rounded_to_four_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let campaign_dir = dir.path().join("campaigns/camp-1");
        write_campaign_json(&campaign_dir, &["jvm"]);
        write_cell(&campaign_dir, 1, "base", "jvm", &[("p95", 1.0 / 3.0)]);
        write_cell(&campaign_dir, 1, "cand", "jvm", &[("p95", 2.0 / 3.0)]);

        let report = aggregate_campaign_reports(&campaign_dir).unwrap();
        let row = &report.rows[0];
        assert_eq!(row.baseline.median, 0.3333);
        assert_eq!(row.candidate.median, 0.6667);
        // Delta is taken between the rounded sides.
        assert_eq!(row.delta.median, 0.3334);
    }

    #[test]
    fn test_missing_campaign_json_is_a_named_error() {
        let dir = tempfile::tempdir().unwrap();
        let campaign_dir = dir.path().join("campaigns/nope");
        std::fs::create_dir_all(&campaign_dir).unwrap();
        let err = aggregate_campaign_reports(&campaign_dir).unwrap_err();
        assert!(err.to_string().starts_with("campaign.json not found in "));
    }
}
