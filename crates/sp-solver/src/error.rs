//! Error types for solver operations.

use sp_core::CoreError;
use thiserror::Error;

/// Errors that can occur in the numerical kernels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Dimension mismatch: {what} (expected {expected}, got {got})")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Zero pivot at row {row} (value {value:e})")]
    ZeroPivot { row: usize, value: f64 },

    #[error("Singular matrix: {what}")]
    Singular { what: String },

    #[error("Root not bracketed on [{lo}, {hi}]: f(lo)={f_lo:e}, f(hi)={f_hi:e}")]
    NotBracketed {
        lo: f64,
        hi: f64,
        f_lo: f64,
        f_hi: f64,
    },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Numeric error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
