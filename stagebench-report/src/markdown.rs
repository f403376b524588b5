//! Markdown rendering for aggregate reports

use crate::aggregate::AggregateReport;
use std::fmt::Write;

/// Render the human-readable comparison table.
///
/// One row per aggregated `(mode, metric)` pair, numeric columns
/// right-aligned, matching the persisted `aggregate-comparison.md`.
pub fn render_markdown(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Aggregate Comparison");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Baseline: `{}` vs candidate: `{}` (campaign `{}`)",
        report.baseline_slug, report.candidate_slug, report.campaign_id
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| mode | metric | baseline median | candidate median | delta median |"
    );
    let _ = writeln!(out, "| --- | --- | ---: | ---: | ---: |");
    for row in &report.rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            row.platform_mode,
            row.metric,
            row.baseline.median,
            row.candidate.median,
            row.delta.median
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{ComparisonRow, StatBlock};

    fn block(median: f64) -> StatBlock {
        StatBlock {
            median,
            mean: median,
            min: median,
            max: median,
        }
    }

    #[test]
    fn test_render_one_row_table() {
        let report = AggregateReport {
            campaign_id: "camp-1".to_string(),
            baseline_slug: "base".to_string(),
            candidate_slug: "cand".to_string(),
            rows: vec![ComparisonRow {
                platform_mode: "jvm".to_string(),
                metric: "p95".to_string(),
                baseline: block(130.0),
                candidate: block(105.0),
                delta: block(-25.0),
                baseline_samples: 2,
                candidate_samples: 2,
            }],
        };

        let md = render_markdown(&report);
        assert!(md.starts_with("# Aggregate Comparison\n"));
        assert!(md.contains("| mode | metric | baseline median | candidate median | delta median |"));
        assert!(md.contains("| jvm | p95 | 130 | 105 | -25 |"));
        assert!(md.ends_with('\n'));
    }

    #[test]
    fn test_empty_report_still_renders_header() {
        let report = AggregateReport {
            campaign_id: "camp-1".to_string(),
            baseline_slug: "base".to_string(),
            candidate_slug: "cand".to_string(),
            rows: Vec::new(),
        };
        let md = render_markdown(&report);
        assert!(md.contains("| --- | --- | ---: | ---: | ---: |"));
    }
}
