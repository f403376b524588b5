//! Subcommand handlers
//!
//! Each handler takes plain arguments, talks to the library crates, and
//! prints its outcome to stdout. Expensive collaborators (image builds,
//! load generation) stay outside: `build-images` only reports cache
//! decisions and `run-campaign` drives the matrix with a placeholder
//! executor that records empty metrics.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use stagebench_campaign::{load_benchmark_config, CampaignCell, MetricsMap};
use stagebench_report::aggregate_campaign_reports;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Arguments for [`build_images`].
#[derive(Debug)]
pub struct BuildImagesArgs {
    /// Staging root directory.
    pub staging_root: PathBuf,
    /// Version whose images to evaluate.
    pub slug: String,
    /// Modes to evaluate; empty means the benchmark's platform modes.
    pub modes: Vec<String>,
    /// Force a rebuild decision for every mode.
    pub force_rebuild_images: bool,
    /// Modes with an individually forced rebuild decision.
    pub force_rebuild_modes: Vec<String>,
    /// Optional JSON file mapping image refs to live image ids.
    pub image_ids: Option<PathBuf>,
    /// Benchmark definition override.
    pub benchmark_path: Option<PathBuf>,
}

/// Arguments for [`run_campaign`].
#[derive(Debug)]
pub struct RunCampaignArgs {
    /// Staging root directory.
    pub staging_root: PathBuf,
    /// Baseline version slug.
    pub baseline: String,
    /// Candidate version slug.
    pub candidate: String,
    /// Repetitions of the full matrix.
    pub runs: u32,
    /// Campaign identifier; generated from the clock when absent.
    pub campaign_id: Option<String>,
    /// Benchmark definition override.
    pub benchmark_path: Option<PathBuf>,
}

/// Scaffold a new staged version.
pub fn create_version(staging_root: &Path, slug: &str, source: &str) -> anyhow::Result<()> {
    let version_dir = stagebench_store::create_version(staging_root, slug, source)?;
    println!("created version '{}' at {}", slug, version_dir.display());
    Ok(())
}

/// Print one cache decision per platform mode for a version's images.
pub fn build_images(args: BuildImagesArgs) -> anyhow::Result<()> {
    let version_dir = args.staging_root.join("versions").join(&args.slug);
    let metadata = stagebench_store::load_version_metadata(&version_dir.join("version.yaml"))
        .with_context(|| format!("loading version '{}'", args.slug))?;

    let benchmark_path = args
        .benchmark_path
        .unwrap_or_else(|| args.staging_root.join("benchmark").join("benchmark.yaml"));
    let benchmark = load_benchmark_config(&benchmark_path)
        .with_context(|| format!("loading benchmark {}", benchmark_path.display()))?;

    let modes = if args.modes.is_empty() {
        benchmark.platform_modes.clone()
    } else {
        args.modes
    };

    let snapshot_fingerprint =
        stagebench_cache::fingerprint_directory(&version_dir.join("snapshot"))?;
    let image_ids = load_image_ids(args.image_ids.as_deref())?;
    let lookup = |image_ref: &str| image_ids.get(image_ref).cloned();
    let force_modes: HashSet<String> = args.force_rebuild_modes.into_iter().collect();
    let manifest_path = version_dir.join("images").join("manifest.json");

    let module_set = benchmark.modules.join(",");
    for mode in &modes {
        let build_fingerprint = stagebench_cache::fingerprint_build_inputs(&[
            mode.as_str(),
            module_set.as_str(),
            metadata.parent.as_str(),
        ]);
        let decision = stagebench_cache::evaluate_cache(
            &manifest_path,
            mode,
            &build_fingerprint,
            &snapshot_fingerprint,
            &lookup,
            args.force_rebuild_images,
            &force_modes,
        )?;
        if decision.rebuild {
            println!("{mode}: rebuild ({})", decision.reason);
        } else {
            // A cache hit always carries a complete manifest entry.
            let image_ref = decision
                .entry
                .map(|e| e.image_ref)
                .unwrap_or_default();
            println!("{mode}: cached ({image_ref})");
        }
    }
    Ok(())
}

/// Execute a comparison campaign and aggregate it.
pub fn run_campaign(args: RunCampaignArgs) -> anyhow::Result<()> {
    let benchmark_path = args
        .benchmark_path
        .unwrap_or_else(|| args.staging_root.join("benchmark").join("benchmark.yaml"));
    let benchmark = load_benchmark_config(&benchmark_path)
        .with_context(|| format!("loading benchmark {}", benchmark_path.display()))?;

    // Both sides must exist before any cell runs.
    for slug in [&args.baseline, &args.candidate] {
        let metadata_path = args
            .staging_root
            .join("versions")
            .join(slug)
            .join("version.yaml");
        stagebench_store::load_version_metadata(&metadata_path)
            .with_context(|| format!("loading version '{slug}'"))?;
    }

    let campaign_id = args.campaign_id.unwrap_or_else(|| {
        format!(
            "campaign-{}",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        )
    });

    let total_cells = args.runs as u64 * benchmark.platform_modes.len() as u64 * 2;
    let pb = ProgressBar::new(total_cells);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let record = stagebench_campaign::run_campaign(
        &args.staging_root,
        &campaign_id,
        &benchmark_path,
        &args.baseline,
        &args.candidate,
        args.runs,
        &benchmark.platform_modes,
        |cell| {
            pb.set_message(format!(
                "run-{:03} {}__{}",
                cell.run_index, cell.version_slug, cell.platform_mode
            ));
            let metrics = placeholder_executor(cell);
            pb.inc(1);
            Ok(metrics)
        },
    )?;
    pb.finish_with_message("campaign complete");

    let report = aggregate_campaign_reports(&record.campaign_dir)?;
    println!(
        "campaign '{}' executed {} cells ({} aggregated rows)",
        record.metadata.campaign_id,
        record.metadata.cells_executed,
        report.rows.len()
    );
    println!(
        "report: {}",
        record.campaign_dir.join("aggregate-comparison.md").display()
    );
    Ok(())
}

/// Re-aggregate a persisted campaign and print the table.
pub fn aggregate(staging_root: &Path, campaign_id: &str) -> anyhow::Result<()> {
    let campaign_dir = staging_root.join("campaigns").join(campaign_id);
    let report = aggregate_campaign_reports(&campaign_dir)?;
    print!("{}", stagebench_report::render_markdown(&report));
    Ok(())
}

/// Promote a candidate into the baseline slot.
pub fn promote(staging_root: &Path, candidate: &str, campaign_id: &str) -> anyhow::Result<()> {
    stagebench_store::promote_candidate_to_baseline(staging_root, candidate, campaign_id)?;
    println!("promoted '{candidate}' to baseline (campaign '{campaign_id}')");
    Ok(())
}

/// Load generation is a collaborator concern; the built-in executor only
/// exercises the matrix layout.
fn placeholder_executor(_cell: &CampaignCell) -> MetricsMap {
    MetricsMap::new()
}

fn load_image_ids(path: Option<&Path>) -> anyhow::Result<HashMap<String, String>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading image-id map {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing image-id map {}", path.display()))
}
