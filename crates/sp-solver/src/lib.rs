//! Linear and scalar numerical kernels used by the particle diffusion solvers.
//!
//! - [`tridiagonal`]: Thomas algorithm over an owned banded matrix
//! - [`dense`]: LU direct solve through nalgebra, used as the fallback path
//! - [`bisection`]: bracketed scalar root finding

pub mod bisection;
pub mod dense;
pub mod error;
pub mod tridiagonal;

pub use bisection::{BisectionConfig, BisectionResult, bisect};
pub use dense::solve_dense;
pub use error::{SolverError, SolverResult};
pub use tridiagonal::{TridiagonalMatrix, solve_tridiagonal};
