//! Export per-model results to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts: one `results.csv` row per processed model, and a separate
//! `rejections.csv` for models the gate dropped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{ModelOutcome, RejectReason};
use crate::error::AppError;

/// Incremental per-model results writer.
///
/// The pipeline consumes each `ModelOutcome` as soon as it is produced, so
/// rows are streamed out instead of being collected for a batch write.
pub struct ResultsWriter {
    writer: BufWriter<File>,
}

impl ResultsWriter {
    pub fn create(path: &Path) -> Result<Self, AppError> {
        let file = File::create(path).map_err(|e| {
            AppError::new(2, format!("Failed to create results CSV '{}': {e}", path.display()))
        })?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "model_id,cls,valid,extrapolation_ratio,chosen_region")
            .map_err(|e| AppError::new(2, format!("Failed to write results CSV header: {e}")))?;
        Ok(Self { writer })
    }

    pub fn write_outcome(&mut self, model_id: u64, outcome: &ModelOutcome) -> Result<(), AppError> {
        let chosen = outcome
            .chosen_region
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "none".to_string());
        writeln!(
            self.writer,
            "{},{:.6e},{},{:.6},{}",
            model_id,
            outcome.final_result.value,
            outcome.final_result.valid,
            outcome.final_result.extrapolation_ratio,
            chosen
        )
        .map_err(|e| AppError::new(2, format!("Failed to write results CSV row: {e}")))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), AppError> {
        self.writer
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to flush results CSV: {e}")))
    }
}

/// Write the rejection list.
pub fn write_rejections_csv(
    path: &Path,
    rejections: &[(u64, RejectReason)],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create rejections CSV '{}': {e}", path.display()))
    })?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "model_id,reason")
        .map_err(|e| AppError::new(2, format!("Failed to write rejections CSV header: {e}")))?;
    for (model_id, reason) in rejections {
        writeln!(writer, "{model_id},{reason}")
            .map_err(|e| AppError::new(2, format!("Failed to write rejections CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush rejections CSV: {e}")))
}
