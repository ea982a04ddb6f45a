//! Synthetic calibration curves and model yields.
//!
//! The generator produces a small multi-analysis region layout with log10
//! polynomial calibration curves and one yields row per model, so the
//! combination pipeline can be exercised without any real scan output.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::LogNormal;

use crate::domain::{CalibrationCurve, CurveScale, CurveShape, ModelYields, RegionId};
use crate::error::AppError;
use crate::io::calib::{CalibFile, RegionCalib};

/// Lower edge of the log10 calibration domain (CLs of 1e-6).
const LOG_DOMAIN_MIN: f64 = -6.0;
/// Upper edge of the log10 calibration domain (CLs of 1).
const LOG_DOMAIN_MAX: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub models: usize,
    pub seed: u64,
    /// Probability that a droppable-analysis yield is absent for a model.
    pub missing_prob: f64,
}

#[derive(Debug, Clone)]
pub struct SampleSet {
    pub calib: CalibFile,
    /// Column order for the yields CSV.
    pub regions: Vec<RegionId>,
    pub models: Vec<ModelYields>,
}

/// The fixed region layout every sample uses.
///
/// `EwkTwoLepton` plays the droppable category and `EwkFourLepton` the
/// non-droppable one; `EwkThreeLepton` carries variants.
fn sample_regions() -> Vec<RegionId> {
    vec![
        RegionId::new("EwkTwoLepton", "SRlow"),
        RegionId::new("EwkTwoLepton", "SRhigh"),
        RegionId::with_variant("EwkThreeLepton", "SR0Z", "a"),
        RegionId::with_variant("EwkThreeLepton", "SR0Z", "b"),
        RegionId::new("EwkFourLepton", "SR0Z"),
        RegionId::new("EwkFourLepton", "SR1Z"),
    ]
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleSet, AppError> {
    if config.models == 0 {
        return Err(AppError::new(2, "Sample model count must be > 0."));
    }
    if !(config.missing_prob >= 0.0 && config.missing_prob < 1.0) {
        return Err(AppError::new(2, "Missing-yield probability must be in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let regions = sample_regions();

    // Per-region yield scale: typical signal yields cluster around a few
    // events with a long right tail.
    let yield_dist = LogNormal::new(0.8, 0.6)
        .map_err(|e| AppError::new(4, format!("Yield distribution error: {e}")))?;

    let mut calib_regions = Vec::with_capacity(regions.len());
    for id in &regions {
        // log10(CLs) falls roughly linearly in the signal yield; the slope
        // sets how quickly a region gains sensitivity.
        let slope = -rng.gen_range(0.15..0.45);
        let intercept = -rng.gen_range(0.01..0.10);
        let observed = log_curve(intercept, slope);
        // Expected curves sit close to observed with a small systematic shift.
        let expected = log_curve(intercept + rng.gen_range(-0.02..0.02), slope * 1.05);
        calib_regions.push(RegionCalib {
            id: id.clone(),
            observed,
            expected: Some(expected),
        });
    }

    let mut models = Vec::with_capacity(config.models);
    for i in 0..config.models {
        let mut model = ModelYields {
            model_id: (i + 1) as u64,
            yields: Default::default(),
        };
        for id in &regions {
            if id.analysis == "EwkTwoLepton" && rng.r#gen::<f64>() < config.missing_prob {
                continue;
            }
            let y: f64 = yield_dist.sample(&mut rng);
            model.yields.insert(id.clone(), y);
        }
        models.push(model);
    }

    Ok(SampleSet {
        calib: CalibFile {
            tool: "cls-combine sample".to_string(),
            generated: Some(chrono::Utc::now()),
            regions: calib_regions,
        },
        regions,
        models,
    })
}

fn log_curve(intercept: f64, slope: f64) -> CalibrationCurve {
    CalibrationCurve {
        scale: CurveScale::Log10,
        domain_min: LOG_DOMAIN_MIN,
        domain_max: LOG_DOMAIN_MAX,
        shape: CurveShape::Polynomial {
            coeffs: vec![intercept, slope],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> SampleConfig {
        SampleConfig {
            models: 50,
            seed,
            missing_prob: 0.2,
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_sample(&config(42)).unwrap();
        let b = generate_sample(&config(42)).unwrap();
        assert_eq!(a.models.len(), b.models.len());
        for (ma, mb) in a.models.iter().zip(&b.models) {
            assert_eq!(ma.model_id, mb.model_id);
            assert_eq!(ma.yields, mb.yields);
        }
    }

    #[test]
    fn missing_yields_stay_in_droppable_analysis() {
        let set = generate_sample(&config(7)).unwrap();
        for model in &set.models {
            for id in &set.regions {
                if id.analysis != "EwkTwoLepton" {
                    assert!(model.yields.contains_key(id), "{id} missing for {}", model.model_id);
                }
            }
        }
        // With 50 models at 20% missing probability some droppable yields are absent.
        let dropped = set
            .models
            .iter()
            .flat_map(|m| set.regions.iter().map(move |r| (m, r)))
            .filter(|(m, r)| r.analysis == "EwkTwoLepton" && !m.yields.contains_key(r))
            .count();
        assert!(dropped > 0);
    }

    #[test]
    fn curves_pass_io_validation() {
        use std::path::PathBuf;

        let set = generate_sample(&config(3)).unwrap();
        let dir = std::env::temp_dir().join("clsc-sample-validation");
        std::fs::create_dir_all(&dir).unwrap();
        let path: PathBuf = dir.join("calib.json");

        crate::io::calib::write_calibration(&path, &set.calib).unwrap();
        let curves = crate::io::calib::read_calibration(&path).unwrap();
        assert_eq!(curves.len(), set.regions.len());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_degenerate_settings() {
        let mut c = config(1);
        c.models = 0;
        assert!(generate_sample(&c).is_err());

        let mut c = config(1);
        c.missing_prob = 1.0;
        assert!(generate_sample(&c).is_err());
    }
}
