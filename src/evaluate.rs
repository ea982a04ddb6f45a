//! Per-region calibration evaluation.
//!
//! Given one model's simulated yield in one signal region, evaluate the
//! region's calibration curve and tag the result:
//!
//! - estimates on the curve's flat high-end plateau are dropped entirely
//!   (indistinguishable from CLs = 1, so they carry no information)
//! - estimates below the validated minimum are kept but flagged invalid,
//!   with the extrapolation ratio recorded
//!
//! The function is pure apart from diagnostic emission.

use tracing::{debug, warn};

use crate::domain::{CalibrationCurve, CurveScale, RegionId, RegionResult};

/// Fraction of the linear-scale domain maximum treated as the plateau cutoff.
const PLATEAU_FRACTION: f64 = 0.999;

/// Evaluate one calibration curve at one yield.
///
/// Returns `None` when the region contributes nothing for this model (plateau
/// saturation or a non-finite curve output); otherwise a linear-scale
/// `RegionResult`, possibly flagged invalid.
pub fn evaluate_region(
    id: &RegionId,
    curve: &CalibrationCurve,
    signal_yield: f64,
) -> Option<RegionResult> {
    let raw = curve.shape.eval(signal_yield);

    if !raw.is_finite() {
        warn!("{id}: non-finite curve value at yield {signal_yield}, region dropped");
        return None;
    }

    // High-plateau guard. On a log curve the bound is already in log space.
    let saturated = match curve.scale {
        CurveScale::Linear => raw >= PLATEAU_FRACTION * curve.domain_max,
        CurveScale::Log10 => raw >= curve.domain_max,
    };
    if saturated {
        debug!("{id}: CLs estimate at the curve plateau, region dropped");
        return None;
    }

    let value = curve.scale.to_linear(raw);
    let min_linear = curve.domain_min_linear();

    if value >= min_linear {
        Some(RegionResult::from_value(value))
    } else {
        let ratio = value / min_linear;
        warn!("{id}: CLs = {value:.6e} below the calibrated min of {min_linear:.6e}");
        Some(RegionResult {
            value,
            valid: false,
            extrapolation_ratio: ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurveShape;

    fn linear_curve(domain_min: f64, domain_max: f64) -> CalibrationCurve {
        // Identity map: the yield *is* the CLs value, which makes the
        // branch boundaries explicit in tests.
        CalibrationCurve {
            scale: CurveScale::Linear,
            domain_min,
            domain_max,
            shape: CurveShape::Polynomial {
                coeffs: vec![0.0, 1.0],
            },
        }
    }

    fn log_curve(domain_min: f64) -> CalibrationCurve {
        // log10(CLs) = -0.5 * yield, fit range capped at log10(1) = 0.
        CalibrationCurve {
            scale: CurveScale::Log10,
            domain_min,
            domain_max: 0.0,
            shape: CurveShape::Polynomial {
                coeffs: vec![0.0, -0.5],
            },
        }
    }

    fn id() -> RegionId {
        RegionId::new("EwkThreeLepton", "SR0a")
    }

    #[test]
    fn valid_inside_domain() {
        let curve = linear_curve(0.01, 1.0);
        let r = evaluate_region(&id(), &curve, 0.03).unwrap();
        assert!(r.valid);
        assert_eq!(r.value, 0.03);
        assert_eq!(r.extrapolation_ratio, 1.0);
    }

    #[test]
    fn below_domain_min_is_invalid_with_ratio() {
        let curve = linear_curve(0.01, 1.0);
        let r = evaluate_region(&id(), &curve, 0.004).unwrap();
        assert!(!r.valid);
        assert!((r.extrapolation_ratio - 0.4).abs() < 1e-12);
        assert!(r.extrapolation_ratio > 0.0 && r.extrapolation_ratio < 1.0);
    }

    #[test]
    fn linear_plateau_is_rejected() {
        let curve = linear_curve(0.01, 1.0);
        // 0.999 * domain_max exactly: at the cutoff counts as saturated.
        assert!(evaluate_region(&id(), &curve, 0.999).is_none());
        assert!(evaluate_region(&id(), &curve, 0.9991).is_none());
        assert!(evaluate_region(&id(), &curve, 0.9).is_some());
    }

    #[test]
    fn log_plateau_uses_log_space_bound() {
        let curve = log_curve(-4.0);
        // Yield 0 maps to log10(CLs) = 0 = domain_max: saturated.
        assert!(evaluate_region(&id(), &curve, 0.0).is_none());
        let r = evaluate_region(&id(), &curve, 2.0).unwrap();
        // log10(CLs) = -1 -> CLs = 0.1, linear storage.
        assert!((r.value - 0.1).abs() < 1e-12);
        assert!(r.valid);
    }

    #[test]
    fn log_curve_extrapolation_ratio_is_linear_scale() {
        let curve = log_curve(-2.0); // min CLs = 0.01
        let r = evaluate_region(&id(), &curve, 6.0).unwrap(); // CLs = 1e-3
        assert!(!r.valid);
        assert!((r.extrapolation_ratio - 0.1).abs() < 1e-12);
    }

    #[test]
    fn validity_monotone_around_domain_min() {
        let curve = linear_curve(0.02, 1.0);
        for &y in &[0.02, 0.05, 0.5] {
            assert!(evaluate_region(&id(), &curve, y).unwrap().valid);
        }
        for &y in &[0.019, 0.001] {
            let r = evaluate_region(&id(), &curve, y).unwrap();
            assert!(!r.valid);
            assert!(r.extrapolation_ratio < 1.0);
        }
    }

    #[test]
    fn non_finite_curve_output_drops_region() {
        let curve = CalibrationCurve {
            scale: CurveScale::Linear,
            domain_min: 0.01,
            domain_max: 1.0,
            shape: CurveShape::Polynomial {
                coeffs: vec![f64::NAN],
            },
        };
        assert!(evaluate_region(&id(), &curve, 1.0).is_none());
    }
}
