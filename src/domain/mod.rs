//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calibration curve value objects (`CalibrationCurve`, `CurveShape`)
//! - structured region identifiers (`RegionId`)
//! - per-region and per-model results (`RegionResult`, `ModelOutcome`)
//! - run configuration (`CombineConfig`, `Strategy`, `RankingSource`)

pub mod types;

pub use types::*;
