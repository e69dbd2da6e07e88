//! Model evaluation: sinusoid primitives and the combined trend + season model.
//!
//! Models are small, pure functions so the fitting code can stay generic.

pub mod model;

pub use model::*;
