//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated input container (`Series`)
//! - fitted models (`TrendModel`, `SeasonalModel`) and their fit outputs
//! - run configuration (`DecompConfig`) and the saved model file (`ModelFile`)

pub mod types;

pub use types::*;
