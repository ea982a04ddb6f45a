//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during the per-model combination loop
//! - written to / reloaded from calibration JSON files
//! - exported alongside per-model results

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Scale of the values a calibration curve produces and bounds its domain in.
///
/// On a `Log10` curve everything (curve output, `domain_min`, `domain_max`) is
/// log10 of the true CLs-like quantity. Conversion back to linear scale happens
/// in the evaluator, before any value is stored or compared across curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CurveScale {
    Linear,
    Log10,
}

impl CurveScale {
    /// Convert a raw curve output to linear scale.
    pub fn to_linear(self, raw: f64) -> f64 {
        match self {
            CurveScale::Linear => raw,
            CurveScale::Log10 => 10f64.powf(raw),
        }
    }
}

/// The evaluable yield -> CLs map of a fitted calibration curve.
///
/// Shapes are plain data, constructed fully at calibration-load time and never
/// augmented afterwards. Output is in the curve's native scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CurveShape {
    /// Polynomial in the yield, `coeffs[0] + coeffs[1]*y + ...`.
    Polynomial { coeffs: Vec<f64> },
    /// Piecewise-linear interpolation over the fitted (yield, value) points.
    ///
    /// `yields` must be strictly increasing; queries outside the knot range are
    /// clamped to the end segments' linear extension.
    Interpolated { yields: Vec<f64>, values: Vec<f64> },
}

impl CurveShape {
    /// Evaluate the curve at the given yield (native scale output).
    pub fn eval(&self, signal_yield: f64) -> f64 {
        match self {
            CurveShape::Polynomial { coeffs } => {
                // Horner's rule.
                coeffs.iter().rev().fold(0.0, |acc, &c| acc * signal_yield + c)
            }
            CurveShape::Interpolated { yields, values } => {
                interpolate(yields, values, signal_yield)
            }
        }
    }
}

fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    // Loader guarantees len >= 2 and strictly increasing xs.
    let n = xs.len();
    let hi = match xs.iter().position(|&k| k >= x) {
        Some(0) => 1,
        Some(i) => i,
        None => n - 1,
    };
    let lo = hi - 1;
    let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
    ys[lo] + t * (ys[hi] - ys[lo])
}

/// A fitted yield -> CLs calibration curve for one signal region.
///
/// Constructed once per region by the calibration loader and immutable for the
/// lifetime of a batch run. `domain_min` is the smallest CLs-like value actually
/// observed in the fit; `domain_max` is the upper bound of the fit range. Both
/// are in the curve's native scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub scale: CurveScale,
    pub domain_min: f64,
    pub domain_max: f64,
    pub shape: CurveShape,
}

impl CalibrationCurve {
    /// The validated minimum of the curve, converted to linear scale.
    pub fn domain_min_linear(&self) -> f64 {
        self.scale.to_linear(self.domain_min)
    }
}

/// Structured identifier for one signal region.
///
/// Replaces the historical `analysis_SR_variant` string concatenation: parsing
/// happens once at load time and lookups use this struct as a composite key.
/// The `Ord` impl (lexicographic on analysis, region, variant) is load-bearing:
/// it defines the deterministic tie-break in best-region selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId {
    pub analysis: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl RegionId {
    pub fn new(analysis: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            analysis: analysis.into(),
            region: region.into(),
            variant: None,
        }
    }

    pub fn with_variant(
        analysis: impl Into<String>,
        region: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            analysis: analysis.into(),
            region: region.into(),
            variant: Some(variant.into()),
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(v) => write!(f, "{}_{}_{}", self.analysis, self.region, v),
            None => write!(f, "{}_{}", self.analysis, self.region),
        }
    }
}

/// One region's CLs-like estimate for one model.
///
/// `value` is always stored in linear scale. `extrapolation_ratio` is only
/// meaningful when `valid` is false, where it records `value / domain_min`
/// (always < 1): how far below the calibrated range the estimate fell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    pub value: f64,
    pub valid: bool,
    pub extrapolation_ratio: f64,
}

impl RegionResult {
    /// A fresh, fully valid result from a bare CLs-like value.
    pub fn from_value(value: f64) -> Self {
        Self {
            value,
            valid: true,
            extrapolation_ratio: 1.0,
        }
    }

    /// An independent copy of an existing result.
    ///
    /// Downstream truncation operates on the copy, never on the original.
    pub fn from_existing(other: &RegionResult) -> Self {
        *other
    }

    /// The multiplicative identity: CLs 1.0, valid, no extrapolation.
    pub fn neutral() -> Self {
        Self::from_value(1.0)
    }

    /// Multiplication law for combining two region results.
    ///
    /// - `value`: plain product
    /// - `valid`: both factors must be within their calibrated domains
    /// - `extrapolation_ratio`: min of the two (the worse margin dominates)
    pub fn multiply(a: RegionResult, b: RegionResult) -> RegionResult {
        RegionResult {
            value: a.value * b.value,
            valid: a.valid && b.valid,
            extrapolation_ratio: a.extrapolation_ratio.min(b.extrapolation_ratio),
        }
    }

    /// Fold the multiplication law over an ordered list of results.
    ///
    /// An empty slice yields the neutral identity.
    pub fn product_of(results: &[RegionResult]) -> RegionResult {
        results
            .iter()
            .copied()
            .fold(RegionResult::neutral(), RegionResult::multiply)
    }

    /// Clamp the value to `floor` from below, leaving the validity flag and
    /// extrapolation ratio untouched. Idempotent.
    pub fn truncated(self, floor: f64) -> RegionResult {
        RegionResult {
            value: self.value.max(floor),
            ..self
        }
    }
}

/// The combined outcome for one model.
///
/// If `contributing` is empty the model had no sensitive region at all and
/// `final_result` defaults to CLs 1.0, invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutcome {
    pub final_result: RegionResult,
    pub chosen_region: Option<RegionId>,
    pub contributing: BTreeMap<RegionId, RegionResult>,
}

impl ModelOutcome {
    /// Outcome for a model with no sensitive signal region: no exclusion
    /// power, so CLs is defined as 1.
    pub fn insensitive() -> Self {
        Self {
            final_result: RegionResult {
                value: 1.0,
                valid: false,
                extrapolation_ratio: 1.0,
            },
            chosen_region: None,
            contributing: BTreeMap::new(),
        }
    }
}

/// Why a model was dropped from the batch (recoverable, recorded and skipped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RejectReason {
    /// No region has a simulated yield at all.
    AllYieldsMissing,
    /// Every missing yield belongs to the designated cannot-drop category.
    NonDroppableMissing(Vec<RegionId>),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AllYieldsMissing => write!(f, "no yields for any region"),
            RejectReason::NonDroppableMissing(missing) => {
                let labels: Vec<String> = missing.iter().map(|r| r.to_string()).collect();
                write!(f, "missing yields in non-droppable category: {}", labels.join(" "))
            }
        }
    }
}

/// One model's simulated signal yields, keyed by region.
///
/// A region absent from `yields` is *missing* a yield, which is distinct from
/// a yield of zero.
#[derive(Debug, Clone)]
pub struct ModelYields {
    pub model_id: u64,
    pub yields: BTreeMap<RegionId, f64>,
}

/// All calibration curves for a run: one observed curve per region, plus an
/// optional expected counterpart used for sensitivity-based ranking.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSet {
    pub observed: BTreeMap<RegionId, CalibrationCurve>,
    pub expected: BTreeMap<RegionId, CalibrationCurve>,
}

impl CalibrationSet {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// True if every observed region also has an expected curve.
    pub fn expected_complete(&self) -> bool {
        self.observed.keys().all(|id| self.expected.contains_key(id))
    }
}

/// How to turn multiple per-region results into one final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Report the single best region's result.
    SingleBest,
    /// Multiply the results of the two smallest-ranked regions.
    ProductOfTwoSmallest,
}

/// Which values decide "which region is best".
///
/// `Expected` ranks by the expected-curve results (the a-priori sensitivity)
/// while still reporting observed values for the chosen region(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankingSource {
    Observed,
    Expected,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct CombineConfig {
    pub calib_path: PathBuf,
    pub yields_path: PathBuf,
    pub out_dir: PathBuf,

    pub strategy: Strategy,
    pub ranking: RankingSource,

    /// Clamp final values to `truncation_floor` from below.
    pub truncate: bool,
    pub truncation_floor: f64,

    /// Analysis name whose regions must never be dropped for missing yields.
    pub non_droppable_analysis: Option<String>,
    /// Analysis name whose regions may be dropped for missing yields.
    pub droppable_analysis: Option<String>,

    /// CLs threshold below which a model counts as excluded in the summary.
    pub exclusion_threshold: f64,
    /// Log a progress line every this many models.
    pub progress_every: u64,
}

impl CombineConfig {
    /// Validate settings that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.truncation_floor.is_finite() && self.truncation_floor > 0.0) {
            return Err(AppError::new(2, "Invalid truncation_floor setting."));
        }
        if !(self.exclusion_threshold > 0.0 && self.exclusion_threshold < 1.0) {
            return Err(AppError::new(2, "Invalid exclusion_threshold setting."));
        }
        // Overlapping category membership has no defined resolution; reject it
        // up front rather than guessing per model.
        if let (Some(keep), Some(drop)) =
            (&self.non_droppable_analysis, &self.droppable_analysis)
        {
            if keep == drop {
                return Err(AppError::new(
                    2,
                    format!("Category '{keep}' is configured as both droppable and non-droppable."),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn polynomial_eval_uses_horner() {
        let shape = CurveShape::Polynomial {
            coeffs: vec![1.0, -2.0, 0.5],
        };
        // 1 - 2*3 + 0.5*9 = -0.5
        assert!((shape.eval(3.0) - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn interpolated_eval_is_linear_between_knots() {
        let shape = CurveShape::Interpolated {
            yields: vec![0.0, 10.0],
            values: vec![0.0, -5.0],
        };
        assert!((shape.eval(4.0) - (-2.0)).abs() < 1e-12);
        // End segments extend linearly.
        assert!((shape.eval(12.0) - (-6.0)).abs() < 1e-12);
    }

    #[test]
    fn log_scale_converts_to_linear() {
        assert!((CurveScale::Log10.to_linear(-2.0) - 0.01).abs() < 1e-12);
        assert_eq!(CurveScale::Linear.to_linear(0.3), 0.3);
    }

    #[test]
    fn multiply_law() {
        let a = RegionResult {
            value: 0.1,
            valid: false,
            extrapolation_ratio: 0.5,
        };
        let b = RegionResult {
            value: 0.2,
            valid: false,
            extrapolation_ratio: 0.3,
        };
        let p = RegionResult::multiply(a, b);
        assert_eq!(p.value, 0.1 * 0.2);
        assert!(!p.valid);
        assert_eq!(p.extrapolation_ratio, 0.3);
    }

    #[test]
    fn multiply_keeps_valid_only_if_both_valid() {
        let a = RegionResult::from_value(0.1);
        let b = RegionResult::from_value(0.2);
        assert!(RegionResult::multiply(a, b).valid);

        let c = RegionResult {
            valid: false,
            ..b
        };
        assert!(!RegionResult::multiply(a, c).valid);
    }

    #[test]
    fn product_of_folds_from_neutral() {
        let rs = [
            RegionResult::from_value(0.5),
            RegionResult::from_value(0.2),
            RegionResult::from_value(0.1),
        ];
        let p = RegionResult::product_of(&rs);
        assert!((p.value - 0.01).abs() < 1e-15);
        assert!(p.valid);

        let empty = RegionResult::product_of(&[]);
        assert_eq!(empty, RegionResult::neutral());
    }

    #[test]
    fn truncation_is_idempotent() {
        let r = RegionResult {
            value: 2e-7,
            valid: false,
            extrapolation_ratio: 0.4,
        };
        let once = r.truncated(1e-6);
        let twice = once.truncated(1e-6);
        assert_eq!(once.value, 1e-6);
        assert_eq!(once, twice);
        assert!(!once.valid);
        assert_eq!(once.extrapolation_ratio, 0.4);

        // Values above the floor are untouched.
        let big = RegionResult::from_value(0.3).truncated(1e-6);
        assert_eq!(big.value, 0.3);
    }

    #[test]
    fn region_id_display_and_order() {
        let a = RegionId::new("EwkFourLepton", "SR0Z");
        let b = RegionId::with_variant("EwkThreeLepton", "SR0a", "16");
        assert_eq!(a.to_string(), "EwkFourLepton_SR0Z");
        assert_eq!(b.to_string(), "EwkThreeLepton_SR0a_16");
        assert!(a < b); // lexicographic on analysis first
    }

    #[test]
    fn validate_rejects_overlapping_categories() {
        let mut config = test_config();
        config.non_droppable_analysis = Some("EwkFourLepton".into());
        config.droppable_analysis = Some("EwkFourLepton".into());
        assert!(config.validate().is_err());
    }

    pub(crate) fn test_config() -> CombineConfig {
        CombineConfig {
            calib_path: PathBuf::from("calib.json"),
            yields_path: PathBuf::from("yields.csv"),
            out_dir: PathBuf::from("results"),
            strategy: Strategy::SingleBest,
            ranking: RankingSource::Observed,
            truncate: false,
            truncation_floor: 1e-6,
            non_droppable_analysis: Some("EwkFourLepton".into()),
            droppable_analysis: Some("EwkTwoLepton".into()),
            exclusion_threshold: 0.05,
            progress_every: 1000,
        }
    }
}
