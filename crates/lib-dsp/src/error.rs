//! Error types for DSP operations.
//!
//! Degenerate numerics (evaluating at a pole, ill-conditioned roots) are not
//! errors: they surface as IEEE infinities or NaN in the returned data.

use lib_expr::ParseError;
use thiserror::Error;

/// Errors that can occur during DSP operations.
#[derive(Debug, Error)]
pub enum DspError {
    /// A configuration value violates its precondition.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for operation.
    #[error("Insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Coefficient vector that cannot describe a polynomial ratio.
    #[error("Invalid coefficients: {0}")]
    InvalidCoefficients(String),

    /// Numerator degree exceeds denominator degree.
    #[error("Improper transfer function: numerator degree {num_degree} > denominator degree {den_degree}")]
    ImproperTransferFunction { num_degree: usize, den_degree: usize },

    /// Time vector that does not strictly increase.
    #[error("Time vector must be strictly increasing (index {index})")]
    NonMonotonicTime { index: usize },

    /// A root of the stage being removed has no match in the cascade.
    #[error("Stage mismatch: {0}")]
    StageMismatch(String),

    /// Expression text could not be parsed.
    #[error("Expression error: {0}")]
    Expression(#[from] ParseError),
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;
