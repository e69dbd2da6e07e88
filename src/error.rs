//! Crate-wide error type.
//!
//! Every failure the pipeline can report is one `AppError` variant. The binary
//! maps variants to process exit codes so scripts can tell bad input apart
//! from a fit that did not converge.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Malformed, missing or too short input data.
    #[error("Input error: {0}")]
    Input(String),

    /// Invalid user-supplied settings (window size, degree, ranges, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The nonlinear solver stopped without converging.
    #[error("Fit error: {message} (after {iterations} iterations, last estimate {last_params:?})")]
    Fit {
        message: String,
        last_params: Vec<f64>,
        iterations: usize,
    },

    /// Singular systems and non-finite intermediate values.
    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    pub fn input(message: impl Into<String>) -> Self {
        AppError::Input(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        AppError::Numerical(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        AppError::Io(message.into())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Input(_) | AppError::Configuration(_) | AppError::Io(_) => 2,
            AppError::Serialization(_) => 2,
            AppError::Fit { .. } => 3,
            AppError::Numerical(_) => 4,
            AppError::Network(_) => 5,
        }
    }
}
