//! Bracketed bisection root finder.

use crate::error::SolverError;
use tracing::{trace, warn};

/// Bisection stopping criteria.
#[derive(Clone, Copy, Debug)]
pub struct BisectionConfig {
    /// Stop once the bracket is narrower than this
    pub x_tol: f64,
    /// Stop once |f(mid)| falls below this
    pub f_tol: f64,
    /// Hard cap on halvings
    pub max_iterations: usize,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            x_tol: 1e-14,
            f_tol: 0.0,
            max_iterations: 200,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BisectionResult {
    pub root: f64,
    pub residual: f64,
    pub iterations: usize,
}

/// Find a root of `f` on `[lo, hi]` by bisection.
///
/// `f` must change sign over the bracket. The closure may fail; its error type
/// only needs to absorb [`SolverError`] so callers can bisect over fallible
/// model evaluations without wrapping.
pub fn bisect<F, E>(mut f: F, lo: f64, hi: f64, config: &BisectionConfig) -> Result<BisectionResult, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<SolverError>,
{
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(SolverError::InvalidArg {
            what: "bisection bracket must be finite with lo < hi",
        }
        .into());
    }

    let mut a = lo;
    let mut b = hi;
    let mut f_a = f(a)?;
    let f_b = f(b)?;

    if f_a == 0.0 {
        return Ok(BisectionResult {
            root: a,
            residual: 0.0,
            iterations: 0,
        });
    }
    if f_b == 0.0 {
        return Ok(BisectionResult {
            root: b,
            residual: 0.0,
            iterations: 0,
        });
    }
    if f_a.signum() == f_b.signum() {
        return Err(SolverError::NotBracketed {
            lo,
            hi,
            f_lo: f_a,
            f_hi: f_b,
        }
        .into());
    }

    for iter in 1..=config.max_iterations {
        let mid = 0.5 * (a + b);
        let f_mid = f(mid)?;

        if f_mid == 0.0 || f_mid.abs() < config.f_tol || (b - a) < config.x_tol {
            trace!(root = mid, residual = f_mid, iterations = iter, "bisection converged");
            return Ok(BisectionResult {
                root: mid,
                residual: f_mid,
                iterations: iter,
            });
        }

        if f_a.signum() == f_mid.signum() {
            a = mid;
            f_a = f_mid;
        } else {
            b = mid;
        }
    }

    warn!(lo, hi, width = b - a, "bisection hit its iteration cap");
    Err(SolverError::ConvergenceFailed {
        what: format!(
            "bisection did not converge in {} iterations (bracket width {:e})",
            config.max_iterations,
            b - a
        ),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverResult;

    #[test]
    fn finds_sqrt_two() {
        let r: SolverResult<BisectionResult> =
            bisect(|x| Ok(x * x - 2.0), 0.0, 2.0, &BisectionConfig::default());
        let r = r.unwrap();
        assert!((r.root - 2.0_f64.sqrt()).abs() < 1e-13);
    }

    #[test]
    fn rejects_unbracketed() {
        let r: SolverResult<BisectionResult> =
            bisect(|x| Ok(x * x + 1.0), -1.0, 1.0, &BisectionConfig::default());
        assert!(matches!(r, Err(SolverError::NotBracketed { .. })));
    }

    #[test]
    fn iteration_cap_is_reported() {
        let cfg = BisectionConfig {
            x_tol: 0.0,
            f_tol: 0.0,
            max_iterations: 5,
        };
        let r: SolverResult<BisectionResult> = bisect(|x| Ok(x - 0.3), 0.0, 1.0, &cfg);
        assert!(matches!(r, Err(SolverError::ConvergenceFailed { .. })));
    }

    #[test]
    fn closure_errors_propagate() {
        let r: SolverResult<BisectionResult> = bisect(
            |_| Err(SolverError::InvalidArg { what: "boom" }),
            0.0,
            1.0,
            &BisectionConfig::default(),
        );
        assert_eq!(r.unwrap_err(), SolverError::InvalidArg { what: "boom" });
    }
}
