//! Yields CSV ingest.
//!
//! The yields table has one row per model and one column per region:
//!
//! ```text
//! model_id,EwkFourLepton_SR0Z,EwkTwoLepton_WWa,...
//! 1,0.52,,3.1
//! ```
//!
//! An **empty cell is a missing yield**, which is distinct from `0.0`. Column
//! headers are matched against the region labels of the loaded calibration
//! set once, up front; per-row lookups then use the structured `RegionId`.
//!
//! Design goals (shared with the rest of `io`):
//! - strict schema for required fields (clear errors + exit code 2)
//! - row-level validation (skip bad cells, but report what happened)
//! - no combination logic here

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::warn;

use crate::domain::{CalibrationSet, ModelYields, RegionId};
use crate::error::AppError;

/// A cell- or row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: per-model yields + what was skipped along the way.
#[derive(Debug, Clone)]
pub struct YieldTable {
    pub models: Vec<ModelYields>,
    pub unknown_columns: Vec<String>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load the yields CSV, resolving columns against the calibration set.
pub fn read_yields(path: &Path, curves: &CalibrationSet) -> Result<YieldTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open yields CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read yields CSV headers: {e}")))?
        .clone();

    if headers.get(0) != Some("model_id") {
        return Err(AppError::new(2, "Yields CSV must start with a 'model_id' column."));
    }

    // Resolve each column to a region once; label parsing never happens again.
    let label_map: BTreeMap<String, RegionId> = curves
        .observed
        .keys()
        .map(|id| (id.to_string(), id.clone()))
        .collect();

    let mut columns: Vec<Option<RegionId>> = Vec::with_capacity(headers.len());
    let mut unknown_columns = Vec::new();
    for header in headers.iter().skip(1) {
        match label_map.get(header) {
            Some(id) => columns.push(Some(id.clone())),
            None => {
                warn!("yields CSV column '{header}' matches no calibrated region, ignored");
                unknown_columns.push(header.to_string());
                columns.push(None);
            }
        }
    }

    let mut models = Vec::new();
    let mut row_errors = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    let mut rows_read = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let line = idx + 2; // header is line 1
        let record = record
            .map_err(|e| AppError::new(2, format!("Failed to read yields CSV row {line}: {e}")))?;
        rows_read += 1;

        let Some(id_field) = record.get(0) else {
            row_errors.push(RowError {
                line,
                message: "empty row".to_string(),
            });
            continue;
        };
        let model_id: u64 = match id_field.parse() {
            Ok(v) => v,
            Err(_) => {
                row_errors.push(RowError {
                    line,
                    message: format!("bad model_id '{id_field}'"),
                });
                continue;
            }
        };
        if !seen.insert(model_id) {
            row_errors.push(RowError {
                line,
                message: format!("duplicate model_id {model_id}, row ignored"),
            });
            continue;
        }

        let mut yields = BTreeMap::new();
        for (col, region) in columns.iter().enumerate() {
            let Some(region) = region else { continue };
            let cell = record.get(col + 1).unwrap_or("");
            if cell.is_empty() {
                continue; // missing yield, deliberately not 0.0
            }
            match cell.parse::<f64>() {
                Ok(y) if y.is_finite() => {
                    yields.insert(region.clone(), y);
                }
                _ => {
                    // Treat the cell as missing; the gate decides what that means.
                    row_errors.push(RowError {
                        line,
                        message: format!("bad yield '{cell}' for {region}"),
                    });
                }
            }
        }

        models.push(ModelYields { model_id, yields });
    }

    for err in &row_errors {
        warn!("yields CSV line {}: {}", err.line, err.message);
    }

    Ok(YieldTable {
        models,
        unknown_columns,
        row_errors,
        rows_read,
    })
}

/// Write a yields CSV (used by the sample generator).
///
/// `regions` fixes the column order; a model without a yield for a region
/// gets an empty cell.
pub fn write_yields(
    path: &Path,
    regions: &[RegionId],
    models: &[ModelYields],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create yields CSV '{}': {e}", path.display()))
    })?;

    let labels: Vec<String> = regions.iter().map(|r| r.to_string()).collect();
    writeln!(file, "model_id,{}", labels.join(","))
        .map_err(|e| AppError::new(2, format!("Failed to write yields CSV header: {e}")))?;

    for model in models {
        let cells: Vec<String> = regions
            .iter()
            .map(|r| {
                model
                    .yields
                    .get(r)
                    .map(|y| format!("{y:.6}"))
                    .unwrap_or_default()
            })
            .collect();
        writeln!(file, "{},{}", model.model_id, cells.join(","))
            .map_err(|e| AppError::new(2, format!("Failed to write yields CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CalibrationCurve, CurveScale, CurveShape};

    fn set_with(ids: &[RegionId]) -> CalibrationSet {
        let mut set = CalibrationSet::default();
        for id in ids {
            set.observed.insert(
                id.clone(),
                CalibrationCurve {
                    scale: CurveScale::Linear,
                    domain_min: 0.01,
                    domain_max: 1.0,
                    shape: CurveShape::Polynomial {
                        coeffs: vec![0.0, 1.0],
                    },
                },
            );
        }
        set
    }

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "clsc_yields_test_{}_{}.csv",
            std::process::id(),
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_missing_cells_as_missing_not_zero() {
        let r1 = RegionId::new("EwkFourLepton", "SR0Z");
        let r2 = RegionId::new("EwkTwoLepton", "WWa");
        let set = set_with(&[r1.clone(), r2.clone()]);

        let path = write_temp("model_id,EwkFourLepton_SR0Z,EwkTwoLepton_WWa\n1,0.5,\n2,,0.25\n");
        let table = read_yields(&path, &set).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.models.len(), 2);
        let m1 = &table.models[0];
        assert_eq!(m1.yields.get(&r1), Some(&0.5));
        assert!(!m1.yields.contains_key(&r2));
        let m2 = &table.models[1];
        assert!(!m2.yields.contains_key(&r1));
        assert_eq!(m2.yields.get(&r2), Some(&0.25));
    }

    #[test]
    fn unknown_columns_are_reported_and_ignored() {
        let r1 = RegionId::new("EwkFourLepton", "SR0Z");
        let set = set_with(&[r1.clone()]);

        let path = write_temp("model_id,EwkFourLepton_SR0Z,NotARegion\n1,0.5,9.0\n");
        let table = read_yields(&path, &set).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.unknown_columns, vec!["NotARegion".to_string()]);
        assert_eq!(table.models[0].yields.len(), 1);
    }

    #[test]
    fn duplicate_model_ids_are_row_errors() {
        let r1 = RegionId::new("EwkFourLepton", "SR0Z");
        let set = set_with(&[r1]);

        let path = write_temp("model_id,EwkFourLepton_SR0Z\n1,0.5\n1,0.6\n");
        let table = read_yields(&path, &set).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.models.len(), 1);
        assert_eq!(table.row_errors.len(), 1);
        assert!(table.row_errors[0].message.contains("duplicate"));
    }

    #[test]
    fn missing_model_id_header_is_an_input_error() {
        let r1 = RegionId::new("EwkFourLepton", "SR0Z");
        let set = set_with(&[r1]);

        let path = write_temp("id,EwkFourLepton_SR0Z\n1,0.5\n");
        let err = read_yields(&path, &set).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn write_then_read_round_trip() {
        let r1 = RegionId::new("EwkFourLepton", "SR0Z");
        let r2 = RegionId::new("EwkTwoLepton", "WWa");
        let set = set_with(&[r1.clone(), r2.clone()]);

        let models = vec![ModelYields {
            model_id: 42,
            yields: [(r1.clone(), 1.25)].into_iter().collect(),
        }];

        let path = std::env::temp_dir().join(format!("clsc_yields_rt_{}.csv", std::process::id()));
        write_yields(&path, &[r1.clone(), r2.clone()], &models).unwrap();
        let table = read_yields(&path, &set).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.models.len(), 1);
        assert_eq!(table.models[0].model_id, 42);
        assert_eq!(table.models[0].yields.get(&r1), Some(&1.25));
        assert!(!table.models[0].yields.contains_key(&r2));
    }
}
