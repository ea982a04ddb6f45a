//! Input/output helpers.
//!
//! - calibration JSON read/write + validation (`calib`)
//! - yields CSV ingest (`yields`)
//! - per-model result exports (`export`)

pub mod calib;
pub mod export;
pub mod yields;

pub use calib::*;
pub use export::*;
pub use yields::*;
