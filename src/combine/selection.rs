//! Best-region selection.
//!
//! "Which region is best" can legitimately be decided on two bases:
//!
//! - the observed results themselves, or
//! - the expected results (a-priori sensitivity), while still *reporting*
//!   observed values for whichever region wins.
//!
//! Smaller CLs-like value = stronger exclusion power, so the best region is
//! the one with the numerically smallest ranking value.

use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::{RankingSource, RegionId, RegionResult};

/// The ranking values actually used for a model, plus the basis they came
/// from (expected ranking falls back to observed when incomplete).
#[derive(Debug, Clone)]
pub struct RankingBasis {
    pub values: BTreeMap<RegionId, f64>,
    pub source: RankingSource,
}

/// Build the ranking values for one model's contributing results.
///
/// Expected ranking requires an expected counterpart for *every* contributing
/// region; otherwise the ranking falls back to observed values with a
/// diagnostic (mixing bases within one model would not be meaningful).
pub fn ranking_values(
    results: &BTreeMap<RegionId, RegionResult>,
    expected: &BTreeMap<RegionId, RegionResult>,
    source: RankingSource,
) -> RankingBasis {
    if source == RankingSource::Expected {
        if results.keys().all(|id| expected.contains_key(id)) {
            let values = results
                .keys()
                .map(|id| (id.clone(), expected[id].value))
                .collect();
            return RankingBasis {
                values,
                source: RankingSource::Expected,
            };
        }
        warn!("expected ranking requested but incomplete, falling back to observed values");
    }

    RankingBasis {
        values: results
            .iter()
            .map(|(id, r)| (id.clone(), r.value))
            .collect(),
        source: RankingSource::Observed,
    }
}

/// Select the region with the smallest ranking value.
///
/// Ties break towards the lexicographically smallest `RegionId`: the map
/// iterates in `RegionId` order and only a strictly smaller value displaces
/// the current best. Returns `None` for an empty map.
pub fn select_best(values: &BTreeMap<RegionId, f64>) -> Option<RegionId> {
    let mut best: Option<(&RegionId, f64)> = None;
    for (id, &v) in values {
        match best {
            Some((_, bv)) if v >= bv => {}
            _ => best = Some((id, v)),
        }
    }
    best.map(|(id, _)| id.clone())
}

/// The (up to) two regions with the smallest ranking values, in rank order.
///
/// Ties break by `RegionId`, which keeps the pick deterministic.
pub fn two_smallest(values: &BTreeMap<RegionId, f64>) -> Vec<RegionId> {
    let mut ranked: Vec<(&RegionId, f64)> = values.iter().map(|(id, &v)| (id, v)).collect();
    ranked.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.into_iter().take(2).map(|(id, _)| id.clone()).collect()
}
