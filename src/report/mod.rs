//! Reporting utilities: run summary, forecast tables, p-value display.

pub mod format;

pub use format::*;
