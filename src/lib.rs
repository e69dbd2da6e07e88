//! `trendfit` library crate.
//!
//! The binary (`trendfit`) is a thin wrapper around this library so that:
//!
//! - the decomposition is testable without spawning processes
//! - the pipeline can be driven from other code with a plain `DecompConfig`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
