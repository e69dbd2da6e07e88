//! Fitting stages of the decomposition.
//!
//! Responsibilities:
//!
//! - polynomial trend by least squares (`trend`)
//! - prefix-sum moving average and edge alignment (`smoothing`)
//! - sinusoid fit by Levenberg–Marquardt, plus its starting guess (`seasonal`)

pub mod seasonal;
pub mod smoothing;
pub mod trend;

pub use seasonal::*;
pub use smoothing::*;
pub use trend::*;
