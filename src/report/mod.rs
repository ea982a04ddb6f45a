//! Run bookkeeping: the aggregator seam and the default summary.
//!
//! The engine never owns statistics; it hands each per-model outcome to a
//! `ResultAggregator`. `RunSummary` is the default implementation used by the
//! batch pipeline; `NoopAggregator` exists for callers that only want the
//! exported CSVs.

use std::collections::BTreeMap;

use crate::domain::{ModelOutcome, RejectReason};

pub mod format;

pub use format::format_run_summary;

/// Abstract consumer of per-model outcomes.
pub trait ResultAggregator {
    fn record_outcome(&mut self, model_id: u64, outcome: &ModelOutcome);
    fn record_rejection(&mut self, model_id: u64, reason: &RejectReason);
}

/// Aggregator that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAggregator;

impl ResultAggregator for NoopAggregator {
    fn record_outcome(&mut self, _model_id: u64, _outcome: &ModelOutcome) {}
    fn record_rejection(&mut self, _model_id: u64, _reason: &RejectReason) {}
}

/// Counts kept across a batch run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// CLs threshold below which a model counts as excluded.
    pub exclusion_threshold: f64,
    pub n_models: usize,
    pub n_invalid: usize,
    pub n_excluded: usize,
    pub n_insensitive: usize,
    /// How often each region was chosen as best ("none" for insensitive models).
    pub chosen_counts: BTreeMap<String, usize>,
    pub rejections: Vec<(u64, RejectReason)>,
}

impl RunSummary {
    pub fn new(exclusion_threshold: f64) -> Self {
        Self {
            exclusion_threshold,
            n_models: 0,
            n_invalid: 0,
            n_excluded: 0,
            n_insensitive: 0,
            chosen_counts: BTreeMap::new(),
            rejections: Vec::new(),
        }
    }
}

impl ResultAggregator for RunSummary {
    fn record_outcome(&mut self, _model_id: u64, outcome: &ModelOutcome) {
        self.n_models += 1;
        if !outcome.final_result.valid {
            self.n_invalid += 1;
        }
        if outcome.final_result.value < self.exclusion_threshold {
            self.n_excluded += 1;
        }

        let label = match &outcome.chosen_region {
            Some(region) => region.to_string(),
            None => {
                self.n_insensitive += 1;
                "none".to_string()
            }
        };
        *self.chosen_counts.entry(label).or_insert(0) += 1;
    }

    fn record_rejection(&mut self, model_id: u64, reason: &RejectReason) {
        self.rejections.push((model_id, reason.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RegionId, RegionResult};

    #[test]
    fn summary_counts_models_by_kind() {
        let mut summary = RunSummary::new(0.05);

        let mut excluded = ModelOutcome::insensitive();
        excluded.final_result = RegionResult::from_value(0.01);
        excluded.chosen_region = Some(RegionId::new("EwkFourLepton", "SR0Z"));
        summary.record_outcome(1, &excluded);

        let mut kept = ModelOutcome::insensitive();
        kept.final_result = RegionResult::from_value(0.5);
        kept.chosen_region = Some(RegionId::new("EwkFourLepton", "SR0Z"));
        summary.record_outcome(2, &kept);

        summary.record_outcome(3, &ModelOutcome::insensitive());
        summary.record_rejection(4, &RejectReason::AllYieldsMissing);

        assert_eq!(summary.n_models, 3);
        assert_eq!(summary.n_excluded, 1);
        assert_eq!(summary.n_insensitive, 1);
        assert_eq!(summary.n_invalid, 1); // the insensitive default is invalid
        assert_eq!(summary.chosen_counts["EwkFourLepton_SR0Z"], 2);
        assert_eq!(summary.chosen_counts["none"], 1);
        assert_eq!(summary.rejections.len(), 1);
    }
}
