//! Dense direct solve through nalgebra LU.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Solve `a * x = rhs` with partial-pivoting LU.
pub fn solve_dense(a: DMatrix<f64>, rhs: &[f64]) -> SolverResult<Vec<f64>> {
    if a.nrows() != a.ncols() {
        return Err(SolverError::DimensionMismatch {
            what: "square matrix columns",
            expected: a.nrows(),
            got: a.ncols(),
        });
    }
    if rhs.len() != a.nrows() {
        return Err(SolverError::DimensionMismatch {
            what: "right-hand side",
            expected: a.nrows(),
            got: rhs.len(),
        });
    }

    let b = DVector::from_column_slice(rhs);
    let x = a.lu().solve(&b).ok_or_else(|| SolverError::Singular {
        what: format!("LU solve failed for {}x{} system", b.len(), b.len()),
    })?;

    if x.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::Singular {
            what: "LU solve produced non-finite entries".to_string(),
        });
    }
    Ok(x.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_two_by_two() {
        let a = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0]);
        let x = solve_dense(a, &[9.0, 8.0]).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn singular_matrix_fails() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert!(matches!(
            solve_dense(a, &[1.0, 1.0]),
            Err(SolverError::Singular { .. })
        ));
    }
}
