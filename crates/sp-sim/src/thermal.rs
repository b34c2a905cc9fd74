//! Lumped cell energy balance.
//!
//! ρ V c_p dT/dt = I T (dU_p/dT - dU_n/dT) + I (V - OCV) - h A (T - T_amb)

use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, RK4};
use crate::model::TransientModel;
use sp_cell::{BatteryCell, ThermalParams};

/// Electrical quantities held fixed over one thermal step.
#[derive(Clone, Copy, Debug)]
pub struct HeatSources {
    pub i_app: f64,
    pub voltage: f64,
    pub ocv: f64,
    /// Entropic coefficient of the positive electrode [V/K]
    pub docp_dt_p: f64,
    /// Entropic coefficient of the negative electrode [V/K]
    pub docp_dt_n: f64,
}

impl HeatSources {
    pub fn from_cell(cell: &BatteryCell, i_app: f64, voltage: f64) -> Self {
        Self {
            i_app,
            voltage,
            ocv: cell.ocv(),
            docp_dt_p: cell.positive().docp_dt(),
            docp_dt_n: cell.negative().docp_dt(),
        }
    }

    /// Reversible (entropic) heat at temperature `temp_k` [W].
    pub fn reversible(&self, temp_k: f64) -> f64 {
        self.i_app * temp_k * (self.docp_dt_p - self.docp_dt_n)
    }

    /// Irreversible (polarization) heat [W].
    pub fn irreversible(&self) -> f64 {
        self.i_app * (self.voltage - self.ocv)
    }
}

#[derive(Clone, Debug)]
pub struct ThermalModel {
    params: ThermalParams,
    ambient_k: f64,
}

struct EnergyBalance<'a> {
    model: &'a ThermalModel,
    sources: &'a HeatSources,
}

impl TransientModel for EnergyBalance<'_> {
    type State = f64;

    fn rhs(&mut self, _t: f64, temp: &f64) -> SimResult<f64> {
        Ok(self.model.heating_rate(*temp, self.sources))
    }

    fn add(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn scale(&self, a: &f64, s: f64) -> f64 {
        a * s
    }
}

impl ThermalModel {
    pub fn new(params: ThermalParams, ambient_k: f64) -> Self {
        Self { params, ambient_k }
    }

    pub fn from_cell(cell: &BatteryCell) -> Self {
        Self::new(cell.thermal().clone(), cell.ambient_temperature())
    }

    pub fn ambient(&self) -> f64 {
        self.ambient_k
    }

    /// dT/dt [K/s].
    pub fn heating_rate(&self, temp_k: f64, sources: &HeatSources) -> f64 {
        let p = &self.params;
        let loss = p.h * p.surface_area_m2 * (temp_k - self.ambient_k);
        (sources.reversible(temp_k) + sources.irreversible() - loss)
            / (p.density * p.volume_m3 * p.heat_capacity)
    }

    /// Temperature after one RK4 step of length `dt`.
    pub fn step(&self, temp_k: f64, sources: &HeatSources, t: f64, dt: f64) -> SimResult<f64> {
        let mut ode = EnergyBalance {
            model: self,
            sources,
        };
        let next = RK4.step(&mut ode, t, &temp_k, dt)?;
        if !(next.is_finite() && next > 0.0) {
            return Err(SimError::NonPhysical {
                what: "cell temperature",
                value: next,
            });
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_cell::preset;

    fn idle() -> HeatSources {
        HeatSources {
            i_app: 0.0,
            voltage: 4.0,
            ocv: 4.0,
            docp_dt_p: 0.0,
            docp_dt_n: 0.0,
        }
    }

    #[test]
    fn idle_cell_at_ambient_stays_at_ambient() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let model = ThermalModel::from_cell(&cell);
        let t = model.step(298.15, &idle(), 0.0, 10.0).unwrap();
        assert_eq!(t, 298.15);
    }

    #[test]
    fn warm_cell_relaxes_toward_ambient() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let model = ThermalModel::from_cell(&cell);
        let t = model.step(310.0, &idle(), 0.0, 100.0).unwrap();
        assert!(t < 310.0 && t > 298.15);
    }

    #[test]
    fn polarization_heats_the_cell() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let model = ThermalModel::from_cell(&cell);
        let sources = HeatSources {
            i_app: -1.65,
            voltage: 3.9,
            ocv: 4.0,
            docp_dt_p: 0.0,
            docp_dt_n: 0.0,
        };
        assert!(model.heating_rate(298.15, &sources) > 0.0);
    }
}
