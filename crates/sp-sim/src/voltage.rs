//! Terminal voltage from Butler-Volmer kinetics.
//!
//! V = OCP_p - OCP_n + (2RT/F) [asinh(m_p/2) + asinh(m_n/2)] + I R_cell
//!
//! with m = I / (F k S c_max √c_e √(1 - x) √x) for each electrode.

use crate::error::{SimError, SimResult};
use sp_cell::{BatteryCell, Electrode, ElectrodeRole};
use sp_core::{FARADAY, in_open_unit_interval, two_rt_over_f};

/// Per-electrode quantities entering the kinetic overpotential.
#[derive(Clone, Copy, Debug)]
pub struct ElectrodeKinetics {
    pub role: ElectrodeRole,
    /// Open-circuit potential [V]
    pub ocp: f64,
    /// Reaction rate constant
    pub k: f64,
    /// Electroactive area [m²]
    pub active_area: f64,
    pub max_conc: f64,
    pub soc: f64,
    /// Current carried by the intercalation reaction [A]
    pub current: f64,
}

impl ElectrodeKinetics {
    pub fn from_electrode(electrode: &Electrode, current: f64) -> Self {
        Self {
            role: electrode.role(),
            ocp: electrode.ocp(),
            k: electrode.rate_constant(),
            active_area: electrode.active_area(),
            max_conc: electrode.max_conc(),
            soc: electrode.soc(),
            current,
        }
    }

    /// Dimensionless kinetic argument m.
    fn m(&self, c_e: f64) -> SimResult<f64> {
        if !in_open_unit_interval(self.soc) {
            return Err(SimError::InvalidSoc {
                role: self.role,
                value: self.soc,
            });
        }
        Ok(self.current
            / (FARADAY
                * self.k
                * self.active_area
                * self.max_conc
                * c_e.sqrt()
                * (1.0 - self.soc).sqrt()
                * self.soc.sqrt()))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VoltageInputs {
    pub positive: ElectrodeKinetics,
    pub negative: ElectrodeKinetics,
    pub r_cell: f64,
    /// Electrolyte concentration [mol/m³]
    pub c_e: f64,
    pub temp_k: f64,
    /// Applied cell current [A], used for the ohmic drop
    pub i_app: f64,
}

impl VoltageInputs {
    /// Gather inputs from a cell. `i_p` and `i_n` are the intercalation
    /// currents of each electrode; without side reactions both equal the
    /// applied current.
    pub fn from_cell(cell: &BatteryCell, i_p: f64, i_n: f64) -> Self {
        Self {
            positive: ElectrodeKinetics::from_electrode(cell.positive(), i_p),
            negative: ElectrodeKinetics::from_electrode(cell.negative(), i_n),
            r_cell: cell.r_cell(),
            c_e: cell.electrolyte().conc(),
            temp_k: cell.temperature(),
            i_app: i_p,
        }
    }
}

/// Terminal voltage [V].
pub fn terminal_voltage(inputs: &VoltageInputs) -> SimResult<f64> {
    if !(inputs.c_e.is_finite() && inputs.c_e > 0.0) {
        return Err(SimError::NonPhysical {
            what: "electrolyte concentration",
            value: inputs.c_e,
        });
    }
    if !(inputs.temp_k.is_finite() && inputs.temp_k > 0.0) {
        return Err(SimError::NonPhysical {
            what: "temperature",
            value: inputs.temp_k,
        });
    }
    let m_p = inputs.positive.m(inputs.c_e)?;
    let m_n = inputs.negative.m(inputs.c_e)?;
    let eta = two_rt_over_f(inputs.temp_k) * ((m_p / 2.0).asinh() + (m_n / 2.0).asinh());
    let v = inputs.positive.ocp - inputs.negative.ocp + eta + inputs.i_app * inputs.r_cell;
    if !v.is_finite() {
        return Err(SimError::NonPhysical {
            what: "terminal voltage",
            value: v,
        });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_cell::preset;

    #[test]
    fn rest_voltage_is_ocv() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let v = terminal_voltage(&VoltageInputs::from_cell(&cell, 0.0, 0.0)).unwrap();
        assert!((v - cell.ocv()).abs() < 1e-12);
        assert!((v - 4.155).abs() < 5e-3, "{v}");
    }

    #[test]
    fn polarization_follows_current_sign() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let ocv = cell.ocv();
        let charge = terminal_voltage(&VoltageInputs::from_cell(&cell, 1.65, 1.65)).unwrap();
        let discharge = terminal_voltage(&VoltageInputs::from_cell(&cell, -1.65, -1.65)).unwrap();
        assert!(charge > ocv);
        assert!(discharge < ocv);
    }

    #[test]
    fn rejects_depleted_electrolyte() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let mut inputs = VoltageInputs::from_cell(&cell, 1.0, 1.0);
        inputs.c_e = 0.0;
        assert!(matches!(
            terminal_voltage(&inputs),
            Err(SimError::NonPhysical { .. })
        ));
    }

    #[test]
    fn rejects_soc_outside_unit_interval() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let mut inputs = VoltageInputs::from_cell(&cell, 1.0, 1.0);
        inputs.negative.soc = 1.0;
        assert!(matches!(
            terminal_voltage(&inputs),
            Err(SimError::InvalidSoc {
                role: ElectrodeRole::Negative,
                ..
            })
        ));
    }
}
