//! Crank-Nicolson finite differences on a uniform radial grid.
//!
//! Node 0 sits at the particle centre, where the symmetry condition is applied
//! through the limit of the spherical Laplacian (3 ∂²c/∂r²). The surface node
//! carries the flux boundary condition through a ghost node.
//!
//! With K nodes the spacing is `R/(K-1)`, so the last node lies on the
//! surface rather than one `R/K` short of it. The ghost node enters the
//! surface row scaled by `(A + 2B/R)`, the full `2/r ∂c/∂r` term at r = R,
//! where some formulations keep only `(A + B/R)`.

use super::{AdvanceInput, ConcentrationSolver, checked_soc};
use crate::error::{SimError, SimResult};
use sp_cell::ElectrodeRole;
use sp_solver::{SolverError, TridiagonalMatrix, solve_dense};
use tracing::{trace, warn};

/// Linear solver used for the implicit half of each step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CnMethod {
    /// Thomas algorithm on the banded system
    #[default]
    Thomas,
    /// Dense LU, mainly for cross-checking
    Dense,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrankNicolsonConfig {
    /// Radial nodes including centre and surface
    pub grid_points: usize,
    pub method: CnMethod,
}

impl Default for CrankNicolsonConfig {
    fn default() -> Self {
        Self {
            grid_points: 100,
            method: CnMethod::Thomas,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CrankNicolsonSolver {
    role: ElectrodeRole,
    method: CnMethod,
    max_conc: f64,
    /// Concentration at each node [mol/m³]
    conc: Vec<f64>,
}

impl CrankNicolsonSolver {
    pub fn new(
        role: ElectrodeRole,
        soc_init: f64,
        max_conc: f64,
        config: &CrankNicolsonConfig,
    ) -> SimResult<Self> {
        if config.grid_points < 3 {
            return Err(SimError::InvalidArg {
                what: "Crank-Nicolson grid needs at least 3 nodes",
            });
        }
        if !(max_conc.is_finite() && max_conc > 0.0) {
            return Err(SimError::NonPhysical {
                what: "max concentration",
                value: max_conc,
            });
        }
        let soc_init = checked_soc(role, soc_init)?;
        Ok(Self {
            role,
            method: config.method,
            max_conc,
            conc: vec![soc_init * max_conc; config.grid_points],
        })
    }

    pub fn concentrations(&self) -> &[f64] {
        &self.conc
    }

    /// Assemble the implicit matrix and explicit right-hand side for one step.
    fn assemble(&self, input: &AdvanceInput) -> SimResult<(TridiagonalMatrix, Vec<f64>)> {
        let k = self.conc.len();
        let radius = input.radius;
        let d = input.diffusivity;
        let dr = radius / (k - 1) as f64;
        let a = input.dt * d / (dr * dr);
        let b = input.dt * d / (2.0 * dr);
        let j = input.molar_flux(self.role);
        let r = |i: usize| i as f64 * dr;
        let c = &self.conc;

        let mut diag = vec![1.0 + a; k];
        diag[0] = 1.0 + 3.0 * a;

        let mut lower: Vec<f64> = (1..k).map(|i| -(a / 2.0 - b / r(i))).collect();
        lower[k - 2] = -a;

        let mut upper = Vec::with_capacity(k - 1);
        upper.push(-3.0 * a);
        upper.extend((1..k - 1).map(|i| -(a / 2.0 + b / r(i))));

        let mut rhs = vec![0.0; k];
        rhs[0] = (1.0 - 3.0 * a) * c[0] + 3.0 * a * c[1];
        for i in 1..k - 1 {
            rhs[i] = (1.0 - a) * c[i]
                + (a / 2.0 + b / r(i)) * c[i + 1]
                + (a / 2.0 - b / r(i)) * c[i - 1];
        }
        rhs[k - 1] = (1.0 - a) * c[k - 1] + a * c[k - 2] - (a + 2.0 * b / radius) * (2.0 * dr * j / d);

        Ok((TridiagonalMatrix::new(lower, diag, upper)?, rhs))
    }
}

impl ConcentrationSolver for CrankNicolsonSolver {
    fn role(&self) -> ElectrodeRole {
        self.role
    }

    fn advance(&mut self, input: &AdvanceInput) -> SimResult<f64> {
        input.validate()?;
        let (matrix, rhs) = self.assemble(input)?;
        let next = match self.method {
            CnMethod::Dense => solve_dense(matrix.to_dense(), &rhs)?,
            CnMethod::Thomas => match matrix.solve(&rhs) {
                Ok(x) => x,
                Err(SolverError::ZeroPivot { row, value }) => {
                    warn!(role = %self.role, row, value, "Thomas pivot vanished, using dense LU");
                    solve_dense(matrix.to_dense(), &rhs)?
                }
                Err(e) => return Err(e.into()),
            },
        };
        self.conc = next;
        let soc = self.surface_soc();
        trace!(role = %self.role, soc, "crank-nicolson step");
        checked_soc(self.role, soc)
    }

    fn surface_soc(&self) -> f64 {
        self.conc.last().copied().unwrap_or(0.0) / self.max_conc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conc::test_support::{negative_input, positive_input};

    #[test]
    fn uniform_profile_stays_put_without_current() {
        let mut s = CrankNicolsonSolver::new(
            ElectrodeRole::Positive,
            0.4956,
            51_410.0,
            &CrankNicolsonConfig::default(),
        )
        .unwrap();
        let input = positive_input(1.0, 0.0);
        for _ in 0..20 {
            let soc = s.advance(&input).unwrap();
            assert!((soc - 0.4956).abs() < 1e-12);
        }
    }

    #[test]
    fn thomas_and_dense_agree() {
        let cfg = CrankNicolsonConfig {
            grid_points: 30,
            method: CnMethod::Thomas,
        };
        let mut thomas =
            CrankNicolsonSolver::new(ElectrodeRole::Negative, 0.7568, 31_833.0, &cfg).unwrap();
        let mut dense = CrankNicolsonSolver::new(
            ElectrodeRole::Negative,
            0.7568,
            31_833.0,
            &CrankNicolsonConfig {
                method: CnMethod::Dense,
                ..cfg
            },
        )
        .unwrap();
        let input = negative_input(1.0, -1.65);
        for _ in 0..50 {
            let a = thomas.advance(&input).unwrap();
            let b = dense.advance(&input).unwrap();
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn surface_depletes_before_centre() {
        let mut s = CrankNicolsonSolver::new(
            ElectrodeRole::Negative,
            0.7568,
            31_833.0,
            &CrankNicolsonConfig::default(),
        )
        .unwrap();
        let input = negative_input(1.0, -1.65);
        for _ in 0..100 {
            s.advance(&input).unwrap();
        }
        let c = s.concentrations();
        assert!(c[c.len() - 1] < c[0]);
    }

    #[test]
    fn tiny_grid_rejected() {
        let cfg = CrankNicolsonConfig {
            grid_points: 2,
            ..CrankNicolsonConfig::default()
        };
        assert!(CrankNicolsonSolver::new(ElectrodeRole::Positive, 0.5, 1.0, &cfg).is_err());
    }
}
