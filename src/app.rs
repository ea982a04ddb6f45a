//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads calibration curves and model yields
//! - runs the per-model evaluation and combination batch
//! - prints the run summary
//! - writes the result CSVs

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CombineArgs, SampleArgs};
use crate::data::SampleConfig;
use crate::domain::CombineConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `clsc` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Combine(args) => handle_combine(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_combine(args: CombineArgs) -> Result<(), AppError> {
    let config = combine_config_from_args(&args);
    config.validate()?;

    let run = pipeline::run_combine(&config)?;

    println!("{}", crate::report::format_run_summary(&run.summary, &config));
    println!("results    : {}", run.results_path.display());
    println!("rejections : {}", run.rejections_path.display());
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        models: args.models,
        seed: args.seed,
        missing_prob: args.missing_prob,
    };
    let set = crate::data::generate_sample(&config)?;

    std::fs::create_dir_all(&args.out).map_err(|e| {
        AppError::new(2, format!("Failed to create output dir '{}': {e}", args.out.display()))
    })?;
    let calib_path = args.out.join("calib.json");
    let yields_path = args.out.join("yields.csv");
    crate::io::calib::write_calibration(&calib_path, &set.calib)?;
    crate::io::yields::write_yields(&yields_path, &set.regions, &set.models)?;

    println!("calibration : {}", calib_path.display());
    println!("yields      : {}", yields_path.display());
    Ok(())
}

pub fn combine_config_from_args(args: &CombineArgs) -> CombineConfig {
    CombineConfig {
        calib_path: args.calib.clone(),
        yields_path: args.yields.clone(),
        out_dir: args.out.clone(),
        strategy: args.strategy,
        ranking: args.ranking,
        truncate: args.truncate,
        truncation_floor: args.truncation_floor,
        non_droppable_analysis: args.non_droppable.clone(),
        droppable_analysis: args.droppable.clone(),
        exclusion_threshold: args.exclusion_threshold,
        progress_every: args.progress_every,
    }
}
