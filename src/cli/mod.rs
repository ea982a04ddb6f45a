//! Command-line parsing for the CLs combination tool.
//!
//! Argument parsing and command dispatch live here, away from the evaluation
//! and combination code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{RankingSource, Strategy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "clsc", version, about = "CLs calibration evaluation and combination")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate and combine per-region CLs values for a batch of models.
    Combine(CombineArgs),
    /// Generate a synthetic calibration file and yields CSV for testing.
    Sample(SampleArgs),
}

/// Options for the batch combination run.
#[derive(Debug, Parser, Clone)]
pub struct CombineArgs {
    /// Calibration JSON file (per-region observed/expected curves).
    #[arg(long, value_name = "JSON")]
    pub calib: PathBuf,

    /// Signal yields CSV (one row per model).
    #[arg(long, value_name = "CSV")]
    pub yields: PathBuf,

    /// Output directory for result CSVs.
    #[arg(short = 'o', long, default_value = "results")]
    pub out: PathBuf,

    /// How to combine per-region results into one value.
    #[arg(long, value_enum, default_value_t = Strategy::SingleBest)]
    pub strategy: Strategy,

    /// Which curve set ranks the regions.
    #[arg(long, value_enum, default_value_t = RankingSource::Observed)]
    pub ranking: RankingSource,

    /// Clamp final values below the truncation floor up to the floor.
    #[arg(long)]
    pub truncate: bool,

    /// Floor applied when --truncate is set.
    #[arg(long, default_value_t = 1e-6)]
    pub truncation_floor: f64,

    /// Analysis whose regions must never be dropped for missing yields.
    #[arg(long, value_name = "ANALYSIS")]
    pub non_droppable: Option<String>,

    /// Analysis whose regions may be dropped when their yields are missing.
    #[arg(long, value_name = "ANALYSIS")]
    pub droppable: Option<String>,

    /// CLs threshold below which a model counts as excluded (reporting only).
    #[arg(long, default_value_t = 0.05)]
    pub exclusion_threshold: f64,

    /// Log progress every N models.
    #[arg(long, default_value_t = 1000)]
    pub progress_every: u64,
}

/// Options for synthetic input generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output directory for calib.json and yields.csv.
    #[arg(short = 'o', long, default_value = "sample")]
    pub out: PathBuf,

    /// Number of models to generate.
    #[arg(short = 'n', long, default_value_t = 500)]
    pub models: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability that a droppable-analysis yield is left empty.
    #[arg(long, default_value_t = 0.05)]
    pub missing_prob: f64,
}
