//! Missing-yield gating.
//!
//! Decides, before any curve is evaluated, whether a model is processable at
//! all given which regions have no simulated yield:
//!
//! - all regions missing: the model has no simulated signal, reject it
//! - only the designated non-droppable category missing: dropping it would
//!   discard the analysis's most powerful search, reject the model
//! - only the designated droppable category missing: proceed with the rest
//! - any other mixed pattern: an upstream data fault, abort the batch with a
//!   per-region yield dump
//!
//! The policy never touches curves or results; it only gates evaluation.

use crate::domain::{CalibrationSet, CombineConfig, ModelYields, RegionId, RejectReason};
use crate::error::AppError;

/// Outcome of the gate for one model.
#[derive(Debug, Clone)]
pub enum Gate {
    Proceed,
    Reject(RejectReason),
}

/// Classify a model's missing-yield pattern.
///
/// Expects `config.validate()` to have run: the two categories are disjoint,
/// so checking the non-droppable one first is unambiguous.
pub fn gate_model(
    model: &ModelYields,
    curves: &CalibrationSet,
    config: &CombineConfig,
) -> Result<Gate, AppError> {
    let missing: Vec<&RegionId> = curves
        .observed
        .keys()
        .filter(|id| !model.yields.contains_key(*id))
        .collect();

    if missing.is_empty() {
        return Ok(Gate::Proceed);
    }

    if missing.len() == curves.len() {
        return Ok(Gate::Reject(RejectReason::AllYieldsMissing));
    }

    if let Some(keep) = &config.non_droppable_analysis {
        if missing.iter().all(|id| &id.analysis == keep) {
            return Ok(Gate::Reject(RejectReason::NonDroppableMissing(
                missing.into_iter().cloned().collect(),
            )));
        }
    }

    if let Some(droppable) = &config.droppable_analysis {
        if missing.iter().all(|id| &id.analysis == droppable) {
            return Ok(Gate::Proceed);
        }
    }

    // Some yields present, others absent with no a-priori reason: this is an
    // upstream data-generation fault and must not be silently combined.
    Err(AppError::new(3, anomaly_dump(model, curves)))
}

/// Per-region yield dump for the fatal mixed-missing anomaly, detailed enough
/// to diagnose the data fault without rerunning.
fn anomaly_dump(model: &ModelYields, curves: &CalibrationSet) -> String {
    let mut out = format!(
        "Unexplained missing-yield pattern for model {}:\n",
        model.model_id
    );
    for id in curves.observed.keys() {
        match model.yields.get(id) {
            Some(y) => out.push_str(&format!("  {id} = {y:.6}\n")),
            None => out.push_str(&format!("  {id} = MISSING\n")),
        }
    }
    out.push_str("Some yields are present and others absent without an a-priori reason.");
    out
}
