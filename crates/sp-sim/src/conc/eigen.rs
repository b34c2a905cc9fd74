//! Eigenfunction expansion of spherical diffusion.
//!
//! The surface concentration is split into a volume-average part, a
//! quasi-steady profile term and N decaying modes. Mode k relaxes with rate
//! λ_k² D / R², where λ_k are the positive roots of tan λ = λ.

use super::{AdvanceInput, ConcentrationSolver, checked_soc};
use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, RK4};
use crate::model::TransientModel;
use sp_cell::ElectrodeRole;
use sp_solver::{BisectionConfig, bisect};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EigenConfig {
    /// Number of retained modes
    pub n_terms: usize,
    /// Root finder tolerance for the eigenvalues
    pub x_tol: f64,
}

impl Default for EigenConfig {
    fn default() -> Self {
        Self {
            n_terms: 5,
            x_tol: 1e-14,
        }
    }
}

/// First `n` positive roots of sin λ - λ cos λ = 0.
///
/// Root k lies in (π(k+1), π(k+2)), where the function changes sign.
pub fn eigenvalues(n: usize, x_tol: f64) -> SimResult<Vec<f64>> {
    let cfg = BisectionConfig {
        x_tol,
        ..BisectionConfig::default()
    };
    let pi = std::f64::consts::PI;
    (0..n)
        .map(|k| {
            let lo = pi * (k as f64 + 1.0);
            let hi = pi * (k as f64 + 2.0);
            let r = bisect::<_, SimError>(|x| Ok(x.sin() - x * x.cos()), lo, hi, &cfg)?;
            Ok(r.root)
        })
        .collect()
}

/// Uncoupled mode equations du_k/dt = -λ_k² D u_k / R² + 2 D j_s / R².
struct ModeOde<'a> {
    lambdas: &'a [f64],
    diffusivity: f64,
    radius: f64,
    scaled_flux: f64,
}

impl TransientModel for ModeOde<'_> {
    type State = Vec<f64>;

    fn rhs(&mut self, _t: f64, u: &Vec<f64>) -> SimResult<Vec<f64>> {
        let d_over_r2 = self.diffusivity / (self.radius * self.radius);
        Ok(self
            .lambdas
            .iter()
            .zip(u)
            .map(|(l, u)| -l * l * d_over_r2 * u + 2.0 * d_over_r2 * self.scaled_flux)
            .collect())
    }

    fn add(&self, a: &Vec<f64>, b: &Vec<f64>) -> Vec<f64> {
        a.iter().zip(b).map(|(x, y)| x + y).collect()
    }

    fn scale(&self, a: &Vec<f64>, s: f64) -> Vec<f64> {
        a.iter().map(|x| x * s).collect()
    }
}

#[derive(Clone, Debug)]
pub struct EigenSolver {
    role: ElectrodeRole,
    soc_init: f64,
    lambdas: Vec<f64>,
    modes: Vec<f64>,
    /// Accumulated volume-average change in SOC
    integral: f64,
    soc: f64,
}

impl EigenSolver {
    pub fn new(role: ElectrodeRole, soc_init: f64, config: &EigenConfig) -> SimResult<Self> {
        if config.n_terms == 0 {
            return Err(SimError::InvalidArg {
                what: "eigen expansion needs at least one term",
            });
        }
        let soc_init = checked_soc(role, soc_init)?;
        let lambdas = eigenvalues(config.n_terms, config.x_tol)?;
        Ok(Self {
            role,
            soc_init,
            modes: vec![0.0; lambdas.len()],
            lambdas,
            integral: 0.0,
            soc: soc_init,
        })
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    pub fn modes(&self) -> &[f64] {
        &self.modes
    }
}

impl ConcentrationSolver for EigenSolver {
    fn role(&self) -> ElectrodeRole {
        self.role
    }

    fn advance(&mut self, input: &AdvanceInput) -> SimResult<f64> {
        input.validate()?;
        let d = input.diffusivity;
        let r = input.radius;
        let j = input.molar_flux(self.role);
        // Dimensionless surface flux
        let js = -j * r / (d * input.max_conc);

        let mut ode = ModeOde {
            lambdas: &self.lambdas,
            diffusivity: d,
            radius: r,
            scaled_flux: js,
        };
        self.modes = RK4.step(&mut ode, input.t_prev, &self.modes, input.dt)?;
        self.integral += 3.0 * d * js / (r * r) * input.dt;

        let transient: f64 = self
            .lambdas
            .iter()
            .zip(&self.modes)
            .map(|(l, u)| u - 2.0 * js / (l * l))
            .sum();
        let soc = self.soc_init + js / 5.0 + self.integral + transient;
        trace!(role = %self.role, soc, "eigen step");
        self.soc = soc;
        checked_soc(self.role, soc)
    }

    fn surface_soc(&self) -> f64 {
        self.soc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conc::test_support::negative_input;

    #[test]
    fn eigenvalues_match_tabulated_roots() {
        let l = eigenvalues(5, 1e-14).unwrap();
        let expected = [
            4.493409457910043,
            7.725251836937707,
            10.904121659428899,
            14.066193912831473,
            17.220755271930768,
        ];
        for (a, b) in l.iter().zip(expected) {
            assert!((a - b).abs() < 4.5e-10, "{a} vs {b}");
        }
    }

    #[test]
    fn zero_terms_rejected() {
        let cfg = EigenConfig {
            n_terms: 0,
            ..EigenConfig::default()
        };
        assert!(EigenSolver::new(ElectrodeRole::Positive, 0.5, &cfg).is_err());
    }

    #[test]
    fn negative_electrode_delithiates_on_discharge() {
        let mut s = EigenSolver::new(ElectrodeRole::Negative, 0.7568, &EigenConfig::default())
            .unwrap();
        let input = negative_input(1.0, -1.65);
        let first = s.advance(&input).unwrap();
        assert!((first - 0.74867).abs() < 1e-4, "{first}");
        let second = s.advance(&input).unwrap();
        assert!(second < first);
    }

    #[test]
    fn zero_current_keeps_initial_soc() {
        let mut s = EigenSolver::new(ElectrodeRole::Positive, 0.4956, &EigenConfig::default())
            .unwrap();
        let mut input = negative_input(1.0, 0.0);
        input.active_area = 1.1167;
        for _ in 0..10 {
            assert_eq!(s.advance(&input).unwrap(), 0.4956);
        }
    }
}
