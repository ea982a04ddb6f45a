//! Per-model combination of region results.
//!
//! Responsibilities:
//!
//! - rank contributing regions (observed or expected values)
//! - select the best region (smallest ranking value)
//! - apply the configured combination strategy and optional truncation

pub mod engine;
pub mod selection;

pub use engine::*;
pub use selection::*;
