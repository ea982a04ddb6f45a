//! The per-model combination engine.
//!
//! For one model: missing-yield gate, per-region curve evaluation, best-region
//! selection, combination strategy, optional truncation. Curves are read-only
//! and shared across all models; every `RegionResult`/`ModelOutcome` is
//! allocated fresh, so models are independent of each other.

use tracing::warn;

use crate::domain::{
    CalibrationSet, CombineConfig, ModelOutcome, ModelYields, RegionResult, RejectReason, Strategy,
};
use crate::error::AppError;
use crate::evaluate::evaluate_region;
use crate::policy::{Gate, gate_model};

use super::selection::{ranking_values, select_best, two_smallest};

/// What happened to one model.
///
/// `Rejected` is recoverable (recorded and skipped); only the mixed-missing
/// anomaly escapes as an `AppError` and stops the batch.
#[derive(Debug, Clone)]
pub enum ModelDecision {
    Outcome(ModelOutcome),
    Rejected(RejectReason),
}

/// Evaluates and combines one model at a time against a fixed calibration set.
pub struct Engine<'a> {
    curves: &'a CalibrationSet,
    config: &'a CombineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(curves: &'a CalibrationSet, config: &'a CombineConfig) -> Self {
        Self { curves, config }
    }

    /// Run the full evaluation-and-combination chain for one model.
    pub fn analyse_model(&self, model: &ModelYields) -> Result<ModelDecision, AppError> {
        match gate_model(model, self.curves, self.config)? {
            Gate::Reject(reason) => return Ok(ModelDecision::Rejected(reason)),
            Gate::Proceed => {}
        }

        let mut contributing = std::collections::BTreeMap::new();
        let mut expected_results = std::collections::BTreeMap::new();

        for (id, curve) in &self.curves.observed {
            // Regions gated as droppable simply have no yield entry here.
            let Some(&signal_yield) = model.yields.get(id) else {
                continue;
            };
            let Some(result) = evaluate_region(id, curve, signal_yield) else {
                continue;
            };
            contributing.insert(id.clone(), result);

            let Some(expected_curve) = self.curves.expected.get(id) else {
                continue;
            };
            if let Some(expected) = evaluate_region(id, expected_curve, signal_yield) {
                expected_results.insert(id.clone(), expected);
            }
        }

        if contributing.is_empty() {
            // Absolutely no sensitive SR.
            return Ok(ModelDecision::Outcome(ModelOutcome::insensitive()));
        }

        let basis = ranking_values(&contributing, &expected_results, self.config.ranking);
        let chosen = select_best(&basis.values);

        let mut final_result = match self.config.strategy {
            Strategy::SingleBest => {
                let Some(best) = &chosen else {
                    return Err(AppError::new(4, "No best region for a non-empty result set."));
                };
                RegionResult::from_existing(&contributing[best])
            }
            Strategy::ProductOfTwoSmallest => {
                let factors: Vec<RegionResult> = two_smallest(&basis.values)
                    .iter()
                    .map(|id| contributing[id])
                    .collect();
                RegionResult::product_of(&factors)
            }
        };

        if self.config.truncate {
            final_result = final_result.truncated(self.config.truncation_floor);
        }

        if !final_result.valid {
            if let Some(best) = &chosen {
                warn!(
                    "model {}: invalid combined result {:.6e} via {best} (ratio {:.3})",
                    model.model_id, final_result.value, final_result.extrapolation_ratio
                );
            }
        }

        Ok(ModelDecision::Outcome(ModelOutcome {
            final_result,
            chosen_region: chosen,
            contributing,
        }))
    }
}
