//! `cls-combine` library crate.
//!
//! The binary (`clsc`) is a thin wrapper around this library so that:
//!
//! - the evaluation/combination core is testable without spawning processes
//! - modules are reusable (e.g., alternative batch drivers, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod combine;
pub mod data;
pub mod domain;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod policy;
pub mod report;
