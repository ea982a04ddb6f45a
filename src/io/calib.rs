//! Read/write calibration JSON files.
//!
//! Calibration JSON is the "portable" representation of a fitted calibration
//! set: one observed curve per region (scale, domain bounds, shape), plus an
//! optional expected counterpart. The fitting step that produces these files
//! lives elsewhere; this module only validates and loads them, so downstream
//! code can use the curves without further checks.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CalibrationCurve, CalibrationSet, CurveScale, CurveShape, RegionId};
use crate::error::AppError;

/// A saved calibration file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibFile {
    pub tool: String,
    /// When the calibration was produced, if the producer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<DateTime<Utc>>,
    pub regions: Vec<RegionCalib>,
}

/// One region's calibration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionCalib {
    #[serde(flatten)]
    pub id: RegionId,
    pub observed: CalibrationCurve,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<CalibrationCurve>,
}

/// Read and validate a calibration JSON file.
pub fn read_calibration(path: &Path) -> Result<CalibrationSet, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open calibration JSON '{}': {e}", path.display()))
    })?;
    let calib: CalibFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid calibration JSON: {e}")))?;

    let mut set = CalibrationSet::default();
    for entry in calib.regions {
        validate_curve(&entry.id, "observed", &entry.observed)?;
        if let Some(expected) = &entry.expected {
            validate_curve(&entry.id, "expected", expected)?;
        }

        if set.observed.insert(entry.id.clone(), entry.observed).is_some() {
            return Err(AppError::new(
                2,
                format!("Duplicate calibration entry for region {}.", entry.id),
            ));
        }
        if let Some(expected) = entry.expected {
            set.expected.insert(entry.id, expected);
        }
    }

    if set.is_empty() {
        return Err(AppError::new(2, "Calibration file contains no regions."));
    }

    Ok(set)
}

/// Write a calibration JSON file (used by the sample generator).
pub fn write_calibration(path: &Path, calib: &CalibFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create calibration JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, calib)
        .map_err(|e| AppError::new(2, format!("Failed to write calibration JSON: {e}")))?;
    Ok(())
}

fn validate_curve(id: &RegionId, which: &str, curve: &CalibrationCurve) -> Result<(), AppError> {
    let bad = |msg: String| AppError::new(2, format!("{id} ({which}): {msg}"));

    if !(curve.domain_min.is_finite() && curve.domain_max.is_finite()) {
        return Err(bad("non-finite domain bounds".to_string()));
    }
    if curve.domain_min >= curve.domain_max {
        return Err(bad(format!(
            "domain_min {} must be below domain_max {}",
            curve.domain_min, curve.domain_max
        )));
    }
    // A log10 curve describes CLs-like values in (0, 1], so its bounds live
    // at or below zero.
    if curve.scale == CurveScale::Log10 && curve.domain_max > 0.0 {
        return Err(bad(format!(
            "log10 curve has positive domain_max {}",
            curve.domain_max
        )));
    }

    match &curve.shape {
        CurveShape::Polynomial { coeffs } => {
            if coeffs.is_empty() {
                return Err(bad("polynomial with no coefficients".to_string()));
            }
            if coeffs.iter().any(|c| !c.is_finite()) {
                return Err(bad("non-finite polynomial coefficient".to_string()));
            }
        }
        CurveShape::Interpolated { yields, values } => {
            if yields.len() != values.len() {
                return Err(bad(format!(
                    "interpolation length mismatch ({} yields, {} values)",
                    yields.len(),
                    values.len()
                )));
            }
            if yields.len() < 2 {
                return Err(bad("interpolation needs at least two points".to_string()));
            }
            if yields.windows(2).any(|w| w[0] >= w[1]) {
                return Err(bad("interpolation yields must be strictly increasing".to_string()));
            }
            if yields.iter().chain(values.iter()).any(|v| !v.is_finite()) {
                return Err(bad("non-finite interpolation point".to_string()));
            }
        }
    }

    Ok(())
}
