#![warn(missing_docs)]
//! Stagebench CLI Library
//!
//! Provides the `stagebench` command line for managing staged service
//! versions and running baseline/candidate comparison campaigns. The binary
//! is a thin wrapper around [`run`]; the subcommand handlers live in
//! [`commands`] and are ordinary library functions so tests can drive them
//! without spawning a process.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stagebench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "stagebench")]
#[command(author, version, about = "Stagebench - staged A/B comparison campaigns")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a new staged version
    CreateVersion {
        /// Slug for the new version
        #[arg(long)]
        slug: String,
        /// Snapshot source: none, baseline, or version:<slug>
        #[arg(long = "from")]
        source: String,
        /// Staging root directory
        #[arg(long, default_value = "staging")]
        staging_root: PathBuf,
    },
    /// Evaluate the image cache for a version, one decision per mode
    BuildImages {
        /// Version whose images to evaluate
        #[arg(long)]
        slug: String,
        /// Platform modes to evaluate (defaults to the benchmark's modes)
        #[arg(long = "mode")]
        modes: Vec<String>,
        /// Force a rebuild decision for every mode
        #[arg(long)]
        force_rebuild_images: bool,
        /// Force a rebuild decision for one mode (repeatable)
        #[arg(long = "force-rebuild-mode")]
        force_rebuild_modes: Vec<String>,
        /// JSON file mapping image refs to live image ids
        #[arg(long)]
        image_ids: Option<PathBuf>,
        /// Benchmark definition (defaults to <root>/benchmark/benchmark.yaml)
        #[arg(long)]
        benchmark_path: Option<PathBuf>,
        /// Staging root directory
        #[arg(long, default_value = "staging")]
        staging_root: PathBuf,
    },
    /// Run a baseline/candidate comparison campaign
    RunCampaign {
        /// Baseline version slug
        #[arg(long)]
        baseline: String,
        /// Candidate version slug
        #[arg(long)]
        candidate: String,
        /// Repetitions of the full matrix
        #[arg(long, default_value = "10")]
        runs: u32,
        /// Campaign identifier (defaults to campaign-<timestamp>)
        #[arg(long)]
        campaign_id: Option<String>,
        /// Benchmark definition (defaults to <root>/benchmark/benchmark.yaml)
        #[arg(long)]
        benchmark_path: Option<PathBuf>,
        /// Staging root directory
        #[arg(long, default_value = "staging")]
        staging_root: PathBuf,
    },
    /// Re-aggregate a persisted campaign
    Aggregate {
        /// Campaign to aggregate
        #[arg(long)]
        campaign_id: String,
        /// Staging root directory
        #[arg(long, default_value = "staging")]
        staging_root: PathBuf,
    },
    /// Promote a candidate into the baseline slot
    Promote {
        /// Candidate version slug
        #[arg(long)]
        candidate: String,
        /// Campaign that justified the promotion
        #[arg(long)]
        campaign_id: String,
        /// Staging root directory
        #[arg(long, default_value = "staging")]
        staging_root: PathBuf,
    },
}

/// Run the stagebench CLI with arguments from the environment.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Tracing filter covering every workspace crate's target.
///
/// Events originate under the underscore crate names
/// (`stagebench_store`, `stagebench_campaign`, ...), and a target
/// directive only matches itself or its children, so each crate is
/// listed explicitly.
fn log_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    [
        "stagebench",
        "stagebench_store",
        "stagebench_cache",
        "stagebench_campaign",
        "stagebench_report",
        "stagebench_cli",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",")
}

/// Run the stagebench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .init();

    match cli.command {
        Commands::CreateVersion {
            slug,
            source,
            staging_root,
        } => commands::create_version(&staging_root, &slug, &source),
        Commands::BuildImages {
            slug,
            modes,
            force_rebuild_images,
            force_rebuild_modes,
            image_ids,
            benchmark_path,
            staging_root,
        } => commands::build_images(commands::BuildImagesArgs {
            staging_root,
            slug,
            modes,
            force_rebuild_images,
            force_rebuild_modes,
            image_ids,
            benchmark_path,
        }),
        Commands::RunCampaign {
            baseline,
            candidate,
            runs,
            campaign_id,
            benchmark_path,
            staging_root,
        } => commands::run_campaign(commands::RunCampaignArgs {
            staging_root,
            baseline,
            candidate,
            runs,
            campaign_id,
            benchmark_path,
        }),
        Commands::Aggregate {
            campaign_id,
            staging_root,
        } => commands::aggregate(&staging_root, &campaign_id),
        Commands::Promote {
            candidate,
            campaign_id,
            staging_root,
        } => commands::promote(&staging_root, &candidate, &campaign_id),
    }
}
