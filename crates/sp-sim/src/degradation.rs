//! SEI film growth on the negative electrode.
//!
//! During charge part of the negative electrode current feeds a solvent
//! reduction side reaction with Tafel kinetics. The side flux j_s thickens the
//! film, adds film resistance and consumes electrolyte. The split between
//! intercalation flux j_i and j_s is found by fixed-point iteration:
//!
//! j_i = j_tot - j_s
//! η_n = (2RT/F) asinh(j_i / 2 j_0)
//! η_s = η_n + U_n - U_s
//! j_s = -(i_s / F) exp(-F η_s / 2RT)

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use sp_cell::{BatteryCell, SeiProperties};
use sp_core::{FARADAY, two_rt_over_f};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    /// Relative change in j_s that counts as converged
    pub rel_tol: f64,
    pub max_iterations: usize,
    /// Film thickness at the start of the run [m]
    pub initial_thickness_m: f64,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            max_iterations: 10,
            initial_thickness_m: 0.0,
        }
    }
}

/// Film state accumulated over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradationState {
    pub thickness_m: f64,
    /// Film resistance added to the cell so far [Ω]
    pub r_sei_ohm: f64,
    /// Fluxes of the most recent step [mol/(m² s)]
    pub j_tot: f64,
    pub j_i: f64,
    pub j_s: f64,
}

/// Outcome of one side-reaction solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeiSolveReport {
    /// Current driving intercalation in the negative electrode [A]
    pub i_intercalation: f64,
    /// Current consumed by the side reaction [A]
    pub i_side: f64,
    pub j_tot: f64,
    pub j_i: f64,
    pub j_s: f64,
    pub iterations: usize,
    /// Last relative change in j_s
    pub residual: f64,
    pub converged: bool,
    /// Film growth over the step [m]
    pub delta_thickness: f64,
    /// Film resistance added over the step [Ω]
    pub delta_r: f64,
    /// Electrolyte concentration change over the step [mol/m³]
    pub delta_conc: f64,
}

impl SeiSolveReport {
    fn inactive(i_app: f64) -> Self {
        Self {
            i_intercalation: i_app,
            i_side: 0.0,
            j_tot: 0.0,
            j_i: 0.0,
            j_s: 0.0,
            iterations: 0,
            residual: 0.0,
            converged: true,
            delta_thickness: 0.0,
            delta_r: 0.0,
            delta_conc: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DegradationModel {
    sei: SeiProperties,
    config: DegradationConfig,
    state: DegradationState,
}

impl DegradationModel {
    pub fn new(sei: SeiProperties, config: DegradationConfig) -> SimResult<Self> {
        sei.validate()?;
        if config.max_iterations == 0 {
            return Err(SimError::InvalidArg {
                what: "degradation needs at least one iteration",
            });
        }
        if !(config.rel_tol.is_finite() && config.rel_tol > 0.0) {
            return Err(SimError::NonPhysical {
                what: "degradation tolerance",
                value: config.rel_tol,
            });
        }
        if !(config.initial_thickness_m.is_finite() && config.initial_thickness_m >= 0.0) {
            return Err(SimError::NonPhysical {
                what: "initial SEI thickness",
                value: config.initial_thickness_m,
            });
        }
        Ok(Self {
            sei,
            config,
            state: DegradationState {
                thickness_m: config.initial_thickness_m,
                ..DegradationState::default()
            },
        })
    }

    /// Build from the cell's SEI properties, if it has any.
    pub fn for_cell(cell: &BatteryCell, config: DegradationConfig) -> SimResult<Self> {
        let sei = cell.sei().cloned().ok_or_else(|| SimError::InsufficientConfig {
            what: "degradation requested but the cell has no SEI properties".to_string(),
        })?;
        Self::new(sei, config)
    }

    pub fn state(&self) -> &DegradationState {
        &self.state
    }

    pub fn properties(&self) -> &SeiProperties {
        &self.sei
    }

    /// Split the negative electrode current for one step and grow the film.
    ///
    /// The cell is only read. Callers apply `delta_r` and `delta_conc` to the
    /// cell before advancing the electrodes with `i_intercalation`.
    pub fn solve(&mut self, cell: &BatteryCell, i_app: f64, dt: f64) -> SimResult<SeiSolveReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "degradation dt must be positive",
            });
        }
        if i_app <= 0.0 {
            self.state.j_tot = 0.0;
            self.state.j_i = 0.0;
            self.state.j_s = 0.0;
            return Ok(SeiSolveReport::inactive(i_app));
        }

        let neg = cell.negative();
        let c_e = cell.electrolyte().conc();
        let j_tot = neg.molar_flux(i_app);
        let j0 = neg.exchange_flux(c_e);
        if !(j0.is_finite() && j0 > 0.0) {
            return Err(SimError::NonPhysical {
                what: "negative exchange flux",
                value: j0,
            });
        }
        let u_n = neg.ocp();
        let two_rt_f = two_rt_over_f(cell.temperature());
        let i_s = self.sei.i_s;
        let u_s = self.sei.u_s;

        let mut j_s = 0.0_f64;
        let mut j_i = j_tot;
        let mut residual = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;
        for iter in 1..=self.config.max_iterations {
            iterations = iter;
            j_i = j_tot - j_s;
            let eta_n = two_rt_f * (j_i / (2.0 * j0)).asinh();
            let eta_s = eta_n + u_n - u_s;
            let prev = j_s;
            j_s = -(i_s / FARADAY) * (-eta_s / two_rt_f).exp();
            if j_s == 0.0 {
                residual = 0.0;
                converged = true;
                break;
            }
            residual = ((j_s - prev) / j_s).abs();
            if residual < self.config.rel_tol {
                converged = true;
                break;
            }
        }
        if !j_s.is_finite() {
            return Err(SimError::ConvergenceFailed {
                what: format!("SEI side flux diverged to {j_s}"),
            });
        }
        if !converged {
            warn!(
                iterations,
                residual, "SEI current split did not converge, using last iterate"
            );
        }

        let delta_thickness = -(self.sei.molar_weight * j_s / self.sei.density) * dt;
        let delta_r = delta_thickness / self.sei.kappa / neg.plate_area();
        let delta_conc = j_s * dt;

        self.state.thickness_m += delta_thickness;
        self.state.r_sei_ohm += delta_r;
        self.state.j_tot = j_tot;
        self.state.j_i = j_i;
        self.state.j_s = j_s;

        let i_intercalation = neg.flux_to_current(j_i);
        debug!(j_tot, j_i, j_s, iterations, "SEI split");
        Ok(SeiSolveReport {
            i_intercalation,
            i_side: i_app - i_intercalation,
            j_tot,
            j_i,
            j_s,
            iterations,
            residual,
            converged,
            delta_thickness,
            delta_r,
            delta_conc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_cell::preset;

    fn cell() -> BatteryCell {
        preset("guo_2011").unwrap().build_cell(0.6, 0.6, 298.15).unwrap()
    }

    fn model(cell: &BatteryCell) -> DegradationModel {
        DegradationModel::for_cell(cell, DegradationConfig::default()).unwrap()
    }

    #[test]
    fn no_side_reaction_outside_charge() {
        let cell = cell();
        let mut m = model(&cell);
        for i in [0.0, -1.65] {
            let r = m.solve(&cell, i, 1.0).unwrap();
            assert_eq!(r.i_intercalation, i);
            assert_eq!(r.j_s, 0.0);
            assert_eq!(r.delta_r, 0.0);
        }
        assert_eq!(m.state().thickness_m, 0.0);
    }

    #[test]
    fn iteration_cap_reports_unconverged_split() {
        let cell = cell();
        let config = DegradationConfig {
            max_iterations: 1,
            ..DegradationConfig::default()
        };
        let mut m = DegradationModel::for_cell(&cell, config).unwrap();
        let r = m.solve(&cell, 1.65, 1.0).unwrap();
        assert!(!r.converged);
        assert_eq!(r.iterations, 1);
        assert!(r.residual > config.rel_tol);
        // The last iterate is still applied.
        assert!(r.j_s < 0.0);
        assert!(m.state().thickness_m > 0.0);
    }

    #[test]
    fn charge_grows_film_and_diverts_current() {
        let cell = cell();
        let mut m = model(&cell);
        let r = m.solve(&cell, 1.65, 1.0).unwrap();
        assert!(r.converged);
        assert!(r.j_s < 0.0);
        assert!(r.delta_thickness > 0.0);
        assert!(r.delta_r > 0.0);
        assert!(r.delta_conc < 0.0);
        // Intercalation current is the applied current minus the side current.
        assert!(r.i_intercalation < 1.65);
        assert!((r.i_intercalation + r.i_side - 1.65).abs() < 1e-12);
        assert!(m.state().thickness_m > 0.0);
    }

    #[test]
    fn zero_side_exchange_current_converges_immediately() {
        let mut params = preset("guo_2011").unwrap();
        if let Some(sei) = params.params.sei.as_mut() {
            sei.i_s = 0.0;
        }
        let cell = params.build_cell(0.6, 0.6, 298.15).unwrap();
        let mut m = model(&cell);
        let r = m.solve(&cell, 1.65, 1.0).unwrap();
        assert!(r.converged);
        assert_eq!(r.iterations, 1);
        assert_eq!(r.j_s, 0.0);
        assert!((r.i_intercalation - 1.65).abs() < 1e-12);
    }

    #[test]
    fn cell_without_sei_is_insufficient_config() {
        let mut p = preset("guo_2011").unwrap();
        p.params.sei = None;
        let cell = p.default_cell().unwrap();
        assert!(matches!(
            DegradationModel::for_cell(&cell, DegradationConfig::default()),
            Err(SimError::InsufficientConfig { .. })
        ));
    }
}
