//! Numerical building blocks: linear and nonlinear least squares, statistics.

pub mod lm;
pub mod ols;
pub mod poly;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use poly::*;
pub use stats::*;
