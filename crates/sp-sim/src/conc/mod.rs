//! Electrode particle surface-concentration solvers.
//!
//! All variants approximate the same problem: Fickian diffusion in a sphere of
//! radius R with a prescribed molar flux at r = R. They share the
//! [`ConcentrationSolver`] contract: advance internal state by one time step
//! and return the new surface SOC, c(R)/c_max.
//!
//! Sign convention: `i_app > 0` is charging. The molar flux leaving the
//! particle is `j = s * i_app / (F S)` with s = +1 for the positive electrode
//! and -1 for the negative one.

mod crank_nicolson;
mod eigen;
mod polynomial;

pub use crank_nicolson::{CnMethod, CrankNicolsonConfig, CrankNicolsonSolver};
pub use eigen::{EigenConfig, EigenSolver, eigenvalues};
pub use polynomial::{PolynomialConfig, PolynomialOrder, PolynomialSolver};

use crate::error::{SimError, SimResult};
use sp_cell::{Electrode, ElectrodeRole};
use sp_core::{FARADAY, in_open_unit_interval};

/// Inputs for one surface-concentration step.
#[derive(Clone, Copy, Debug)]
pub struct AdvanceInput {
    /// Time step [s]
    pub dt: f64,
    /// Time at the start of the step [s]
    pub t_prev: f64,
    /// Applied (intercalation) current for this electrode [A]
    pub i_app: f64,
    /// Particle radius [m]
    pub radius: f64,
    /// Electroactive area [m²]
    pub active_area: f64,
    /// Solid diffusivity [m²/s]
    pub diffusivity: f64,
    /// Maximum concentration [mol/m³]
    pub max_conc: f64,
}

impl AdvanceInput {
    /// Take geometry and transport from the electrode's current state.
    pub fn from_electrode(electrode: &Electrode, dt: f64, t_prev: f64, i_app: f64) -> Self {
        Self {
            dt,
            t_prev,
            i_app,
            radius: electrode.radius(),
            active_area: electrode.active_area(),
            diffusivity: electrode.diffusivity(),
            max_conc: electrode.max_conc(),
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let checks = [
            (self.dt, "time step"),
            (self.radius, "particle radius"),
            (self.active_area, "electroactive area"),
            (self.diffusivity, "solid diffusivity"),
            (self.max_conc, "max concentration"),
        ];
        for (value, what) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::NonPhysical { what, value });
            }
        }
        if !self.i_app.is_finite() {
            return Err(SimError::NonPhysical {
                what: "applied current",
                value: self.i_app,
            });
        }
        Ok(())
    }

    /// Molar flux out of the particle surface [mol/(m² s)].
    pub fn molar_flux(&self, role: ElectrodeRole) -> f64 {
        role.flux_sign() * self.i_app / (FARADAY * self.active_area)
    }
}

/// Common contract of the surface concentration solvers.
pub trait ConcentrationSolver {
    fn role(&self) -> ElectrodeRole;

    /// Advance one step and return the new surface SOC.
    ///
    /// Fails with [`SimError::InvalidSoc`] when the surface SOC leaves (0, 1).
    /// Internal state has already moved when that happens; callers that need
    /// to keep the last valid state should advance a clone.
    fn advance(&mut self, input: &AdvanceInput) -> SimResult<f64>;

    /// Surface SOC after the most recent step (initial SOC before any step).
    fn surface_soc(&self) -> f64;
}

pub(crate) fn checked_soc(role: ElectrodeRole, soc: f64) -> SimResult<f64> {
    if in_open_unit_interval(soc) {
        Ok(soc)
    } else {
        Err(SimError::InvalidSoc { role, value: soc })
    }
}

/// Method selection with its tuning.
#[derive(Clone, Debug, PartialEq)]
pub enum ConcMethod {
    Eigen(EigenConfig),
    CrankNicolson(CrankNicolsonConfig),
    Polynomial(PolynomialConfig),
}

impl Default for ConcMethod {
    fn default() -> Self {
        ConcMethod::Eigen(EigenConfig::default())
    }
}

impl ConcMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ConcMethod::Eigen(_) => "eigen",
            ConcMethod::CrankNicolson(_) => "crank_nicolson",
            ConcMethod::Polynomial(_) => "polynomial",
        }
    }
}

/// Owned solver for one electrode, dispatching to the selected method.
#[derive(Clone, Debug)]
pub enum ElectrodeSolver {
    Eigen(EigenSolver),
    CrankNicolson(CrankNicolsonSolver),
    Polynomial(PolynomialSolver),
}

impl ElectrodeSolver {
    /// Build a solver initialised at the electrode's current SOC.
    pub fn new(method: &ConcMethod, electrode: &Electrode) -> SimResult<Self> {
        let role = electrode.role();
        let soc = electrode.soc();
        let c_max = electrode.max_conc();
        Ok(match method {
            ConcMethod::Eigen(cfg) => ElectrodeSolver::Eigen(EigenSolver::new(role, soc, cfg)?),
            ConcMethod::CrankNicolson(cfg) => {
                ElectrodeSolver::CrankNicolson(CrankNicolsonSolver::new(role, soc, c_max, cfg)?)
            }
            ConcMethod::Polynomial(cfg) => {
                ElectrodeSolver::Polynomial(PolynomialSolver::new(role, soc, c_max, cfg)?)
            }
        })
    }
}

impl ConcentrationSolver for ElectrodeSolver {
    fn role(&self) -> ElectrodeRole {
        match self {
            ElectrodeSolver::Eigen(s) => s.role(),
            ElectrodeSolver::CrankNicolson(s) => s.role(),
            ElectrodeSolver::Polynomial(s) => s.role(),
        }
    }

    fn advance(&mut self, input: &AdvanceInput) -> SimResult<f64> {
        match self {
            ElectrodeSolver::Eigen(s) => s.advance(input),
            ElectrodeSolver::CrankNicolson(s) => s.advance(input),
            ElectrodeSolver::Polynomial(s) => s.advance(input),
        }
    }

    fn surface_soc(&self) -> f64 {
        match self {
            ElectrodeSolver::Eigen(s) => s.surface_soc(),
            ElectrodeSolver::CrankNicolson(s) => s.surface_soc(),
            ElectrodeSolver::Polynomial(s) => s.surface_soc(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AdvanceInput;

    /// Guo 2011 positive electrode transport at 298.15 K.
    pub fn positive_input(dt: f64, i_app: f64) -> AdvanceInput {
        AdvanceInput {
            dt,
            t_prev: 0.0,
            i_app,
            radius: 8.5e-6,
            active_area: 1.1167,
            diffusivity: 1e-14,
            max_conc: 51_410.0,
        }
    }

    /// Guo 2011 negative electrode transport at 298.15 K.
    pub fn negative_input(dt: f64, i_app: f64) -> AdvanceInput {
        AdvanceInput {
            dt,
            t_prev: 0.0,
            i_app,
            radius: 12.5e-6,
            active_area: 0.7824,
            diffusivity: 3.9e-14,
            max_conc: 31_833.0,
        }
    }
}
