//! Thomas algorithm for tridiagonal systems.
//!
//! Inputs are never mutated: the forward sweep works on owned copies of the
//! diagonal and right-hand side.

use crate::error::{SolverError, SolverResult};
use nalgebra::DMatrix;

/// Pivots with magnitude at or below this fraction of the largest diagonal
/// entry are treated as zero.
const PIVOT_REL_EPS: f64 = 1e-14;

/// Banded storage for an n×n tridiagonal matrix.
///
/// `lower[i]` sits at (i+1, i) and `upper[i]` at (i, i+1), so both bands hold
/// n-1 entries.
#[derive(Clone, Debug, PartialEq)]
pub struct TridiagonalMatrix {
    pub lower: Vec<f64>,
    pub diag: Vec<f64>,
    pub upper: Vec<f64>,
}

impl TridiagonalMatrix {
    pub fn new(lower: Vec<f64>, diag: Vec<f64>, upper: Vec<f64>) -> SolverResult<Self> {
        let n = diag.len();
        if n == 0 {
            return Err(SolverError::InvalidArg {
                what: "tridiagonal matrix must have at least one row",
            });
        }
        check_len("lower band", n - 1, lower.len())?;
        check_len("upper band", n - 1, upper.len())?;
        Ok(Self { lower, diag, upper })
    }

    pub fn dim(&self) -> usize {
        self.diag.len()
    }

    /// Solve `self * x = rhs` with the Thomas algorithm.
    pub fn solve(&self, rhs: &[f64]) -> SolverResult<Vec<f64>> {
        solve_tridiagonal(&self.lower, &self.diag, &self.upper, rhs)
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, x: &[f64]) -> SolverResult<Vec<f64>> {
        let n = self.dim();
        check_len("vector", n, x.len())?;
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut acc = self.diag[i] * x[i];
            if i > 0 {
                acc += self.lower[i - 1] * x[i - 1];
            }
            if i + 1 < n {
                acc += self.upper[i] * x[i + 1];
            }
            y[i] = acc;
        }
        Ok(y)
    }

    /// Expand into a dense matrix (for the LU fallback and for tests).
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.dim();
        let mut a = DMatrix::zeros(n, n);
        for i in 0..n {
            a[(i, i)] = self.diag[i];
            if i + 1 < n {
                a[(i + 1, i)] = self.lower[i];
                a[(i, i + 1)] = self.upper[i];
            }
        }
        a
    }

    /// True when every row satisfies |d_i| > |l_i| + |u_i|.
    pub fn is_diagonally_dominant(&self) -> bool {
        let n = self.dim();
        (0..n).all(|i| {
            let off = if i > 0 { self.lower[i - 1].abs() } else { 0.0 }
                + if i + 1 < n { self.upper[i].abs() } else { 0.0 };
            self.diag[i].abs() > off
        })
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> SolverResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(SolverError::DimensionMismatch {
            what,
            expected,
            got,
        })
    }
}

/// Solve a tridiagonal system with the Thomas algorithm.
///
/// `lower` and `upper` have length n-1, `diag` and `rhs` length n.
/// Returns [`SolverError::ZeroPivot`] when elimination meets a (near) zero
/// pivot; diagonally dominant systems never do.
pub fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
) -> SolverResult<Vec<f64>> {
    let n = diag.len();
    if n == 0 {
        return Err(SolverError::InvalidArg {
            what: "tridiagonal system must have at least one row",
        });
    }
    check_len("lower band", n - 1, lower.len())?;
    check_len("upper band", n - 1, upper.len())?;
    check_len("right-hand side", n, rhs.len())?;

    let scale = diag.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
    let pivot_eps = PIVOT_REL_EPS * scale.max(f64::MIN_POSITIVE);

    let mut d = diag.to_vec();
    let mut b = rhs.to_vec();

    check_pivot(0, d[0], pivot_eps)?;
    for i in 1..n {
        let w = lower[i - 1] / d[i - 1];
        d[i] -= w * upper[i - 1];
        b[i] -= w * b[i - 1];
        check_pivot(i, d[i], pivot_eps)?;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = b[n - 1] / d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = (b[i] - upper[i] * x[i + 1]) / d[i];
    }
    Ok(x)
}

fn check_pivot(row: usize, value: f64, eps: f64) -> SolverResult<()> {
    if !value.is_finite() || value.abs() <= eps {
        return Err(SolverError::ZeroPivot { row, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_known_system() {
        // [2 -1 0; -1 2 -1; 0 -1 2] x = [1 0 1] -> x = [1 1 1]
        let x = solve_tridiagonal(&[-1.0, -1.0], &[2.0, 2.0, 2.0], &[-1.0, -1.0], &[1.0, 0.0, 1.0])
            .unwrap();
        for xi in x {
            assert!((xi - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn single_row() {
        let x = solve_tridiagonal(&[], &[4.0], &[], &[2.0]).unwrap();
        assert_eq!(x, vec![0.5]);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let lower = vec![1.0, 1.0];
        let diag = vec![4.0, 4.0, 4.0];
        let upper = vec![1.0, 1.0];
        let rhs = vec![5.0, 6.0, 5.0];
        let _ = solve_tridiagonal(&lower, &diag, &upper, &rhs).unwrap();
        assert_eq!(diag, vec![4.0, 4.0, 4.0]);
        assert_eq!(rhs, vec![5.0, 6.0, 5.0]);
    }

    #[test]
    fn zero_pivot_is_reported() {
        let err = solve_tridiagonal(&[1.0], &[0.0, 1.0], &[1.0], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SolverError::ZeroPivot { row: 0, .. }));

        // Pivot cancels during elimination: d1 - (l0/d0)*u0 = 1 - 1*1 = 0
        let err = solve_tridiagonal(&[1.0], &[1.0, 1.0], &[1.0], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SolverError::ZeroPivot { row: 1, .. }));
    }

    #[test]
    fn band_length_mismatch() {
        let err = TridiagonalMatrix::new(vec![1.0], vec![1.0, 2.0, 3.0], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            SolverError::DimensionMismatch {
                what: "lower band",
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn mul_vec_matches_dense() {
        let m = TridiagonalMatrix::new(vec![1.0, -2.0], vec![5.0, 6.0, 7.0], vec![0.5, 3.0]).unwrap();
        let x = [1.0, 2.0, 3.0];
        let y = m.mul_vec(&x).unwrap();
        let dense = m.to_dense() * nalgebra::DVector::from_column_slice(&x);
        for i in 0..3 {
            assert!((y[i] - dense[i]).abs() < 1e-14);
        }
        assert!(m.is_diagonally_dominant());
    }
}
