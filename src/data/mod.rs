//! Synthetic input generation for trying out the pipeline end to end.

pub mod sample;

pub use sample::{generate_sample, SampleConfig, SampleSet};
