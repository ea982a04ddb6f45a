//! The batch combination pipeline.
//!
//! Kept separate from CLI handling so tests (and future front-ends) can run a
//! full batch without going through argument parsing:
//! calibration load -> yields load -> per-model evaluate/combine -> exports.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::combine::{Engine, ModelDecision};
use crate::domain::CombineConfig;
use crate::error::AppError;
use crate::io::export::{write_rejections_csv, ResultsWriter};
use crate::report::{ResultAggregator, RunSummary};

/// All outputs of a single `clsc combine` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub results_path: PathBuf,
    pub rejections_path: PathBuf,
}

/// Execute the full combination batch and return the computed outputs.
///
/// Models are processed in file order, one at a time. A structural anomaly in
/// any model's yields aborts the whole batch via `?`.
pub fn run_combine(config: &CombineConfig) -> Result<RunOutput, AppError> {
    let curves = crate::io::calib::read_calibration(&config.calib_path)?;
    let table = crate::io::yields::read_yields(&config.yields_path, &curves)?;

    info!(
        regions = curves.len(),
        models = table.models.len(),
        rows = table.rows_read,
        "inputs loaded"
    );
    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(2, format!("Failed to create output dir '{}': {e}", config.out_dir.display()))
    })?;
    let results_path = config.out_dir.join("results.csv");
    let rejections_path = config.out_dir.join("rejections.csv");

    let engine = Engine::new(&curves, config);
    let mut writer = ResultsWriter::create(&results_path)?;
    let mut summary = RunSummary::new(config.exclusion_threshold);

    for (i, model) in table.models.iter().enumerate() {
        if config.progress_every > 0 && (i as u64) % config.progress_every == 0 && i > 0 {
            info!("processed {i} of {} models", table.models.len());
        }

        let decision = engine.analyse_model(model).inspect_err(|_| {
            error!("model {}: fatal data anomaly, aborting the batch", model.model_id);
        })?;
        match decision {
            ModelDecision::Outcome(outcome) => {
                writer.write_outcome(model.model_id, &outcome)?;
                summary.record_outcome(model.model_id, &outcome);
            }
            ModelDecision::Rejected(reason) => {
                warn!("model {} rejected: {reason}", model.model_id);
                summary.record_rejection(model.model_id, &reason);
            }
        }
    }

    writer.finish()?;
    write_rejections_csv(&rejections_path, &summary.rejections)?;

    Ok(RunOutput {
        summary,
        results_path,
        rejections_path,
    })
}
