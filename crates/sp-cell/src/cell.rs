//! Battery cell aggregate.

use crate::electrode::{Electrode, ElectrodeParams};
use crate::electrolyte::{Electrolyte, ElectrolyteParams};
use crate::error::{CellError, CellResult};
use crate::ocp::OcpCurve;
use crate::role::ElectrodeRole;
use serde::{Deserialize, Serialize};
use sp_core::{ensure_finite, ensure_positive};
use std::sync::Arc;
use tracing::debug;

/// Lumped thermal parameters of the cell can.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalParams {
    /// Density [kg/m³]
    pub density: f64,
    /// Volume [m³]
    pub volume_m3: f64,
    /// Specific heat capacity [J/(kg K)]
    pub heat_capacity: f64,
    /// Heat transfer coefficient [W/(m² K)]
    pub h: f64,
    /// Cooled surface area [m²]
    pub surface_area_m2: f64,
}

/// Side-reaction (SEI) properties of the negative electrode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeiProperties {
    /// SEI reaction equilibrium potential [V]
    pub u_s: f64,
    /// SEI exchange current density [A/m²]
    pub i_s: f64,
    /// Film molar weight [kg/mol]
    pub molar_weight: f64,
    /// Film density [kg/m³]
    pub density: f64,
    /// Film conductivity [S/m]
    pub kappa: f64,
}

impl SeiProperties {
    pub fn validate(&self) -> CellResult<()> {
        ensure_finite(self.u_s, "SEI potential")?;
        ensure_finite(self.i_s, "SEI exchange current density")?;
        if self.i_s < 0.0 {
            return Err(CellError::InvalidParameter {
                what: "SEI exchange current density",
                value: self.i_s,
            });
        }
        ensure_positive(self.molar_weight, "SEI molar weight")?;
        ensure_positive(self.density, "SEI density")?;
        ensure_positive(self.kappa, "SEI conductivity")?;
        Ok(())
    }
}

/// Complete static parameter set of a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellParams {
    pub positive: ElectrodeParams,
    pub negative: ElectrodeParams,
    pub electrolyte: ElectrolyteParams,
    pub thermal: ThermalParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sei: Option<SeiProperties>,
    /// Nominal capacity [A h]
    pub capacity_ah: f64,
    /// Upper voltage cut-off [V]
    pub v_max: f64,
    /// Lower voltage cut-off [V]
    pub v_min: f64,
}

/// Owns both electrodes, the electrolyte and the cell-level state.
///
/// Each simulation run should own its own cell; `Clone` performs a deep copy
/// of all mutable state (OCP curves are immutable and shared).
#[derive(Clone, Debug)]
pub struct BatteryCell {
    positive: Electrode,
    negative: Electrode,
    electrolyte: Electrolyte,
    thermal: ThermalParams,
    sei: Option<SeiProperties>,
    capacity_ah: f64,
    v_max: f64,
    v_min: f64,
    temp_k: f64,
    ambient_k: f64,
    r_cell: f64,
    r_cell_init: f64,
}

impl BatteryCell {
    pub fn new(
        params: CellParams,
        ocp_p: Arc<dyn OcpCurve>,
        ocp_n: Arc<dyn OcpCurve>,
        soc_p: f64,
        soc_n: f64,
        temp_k: f64,
    ) -> CellResult<Self> {
        ensure_positive(temp_k, "cell temperature")?;
        ensure_positive(params.capacity_ah, "cell capacity")?;
        ensure_positive(params.thermal.density, "cell density")?;
        ensure_positive(params.thermal.volume_m3, "cell volume")?;
        ensure_positive(params.thermal.heat_capacity, "cell heat capacity")?;
        ensure_finite(params.thermal.h, "heat transfer coefficient")?;
        ensure_finite(params.thermal.surface_area_m2, "cell surface area")?;
        ensure_finite(params.v_max, "V_max")?;
        ensure_finite(params.v_min, "V_min")?;
        if params.v_min >= params.v_max {
            return Err(CellError::InvalidParameter {
                what: "V_min must be below V_max",
                value: params.v_min,
            });
        }
        if let Some(sei) = &params.sei {
            sei.validate()?;
        }

        let positive = Electrode::new(ElectrodeRole::Positive, params.positive, ocp_p, soc_p, temp_k)?;
        let negative = Electrode::new(ElectrodeRole::Negative, params.negative, ocp_n, soc_n, temp_k)?;
        let electrolyte = Electrolyte::new(params.electrolyte)?;

        let r_cell = (positive.thickness() / positive.kappa_eff()
            + electrolyte.thickness() / electrolyte.kappa_eff()
            + negative.thickness() / negative.kappa_eff())
            / negative.plate_area();

        Ok(Self {
            positive,
            negative,
            electrolyte,
            thermal: params.thermal,
            sei: params.sei,
            capacity_ah: params.capacity_ah,
            v_max: params.v_max,
            v_min: params.v_min,
            temp_k,
            ambient_k: temp_k,
            r_cell,
            r_cell_init: r_cell,
        })
    }

    pub fn positive(&self) -> &Electrode {
        &self.positive
    }

    pub fn negative(&self) -> &Electrode {
        &self.negative
    }

    pub fn electrode(&self, role: ElectrodeRole) -> &Electrode {
        match role {
            ElectrodeRole::Positive => &self.positive,
            ElectrodeRole::Negative => &self.negative,
        }
    }

    pub fn electrode_mut(&mut self, role: ElectrodeRole) -> &mut Electrode {
        match role {
            ElectrodeRole::Positive => &mut self.positive,
            ElectrodeRole::Negative => &mut self.negative,
        }
    }

    pub fn electrolyte(&self) -> &Electrolyte {
        &self.electrolyte
    }

    pub fn electrolyte_mut(&mut self) -> &mut Electrolyte {
        &mut self.electrolyte
    }

    pub fn thermal(&self) -> &ThermalParams {
        &self.thermal
    }

    pub fn sei(&self) -> Option<&SeiProperties> {
        self.sei.as_ref()
    }

    pub fn capacity_ah(&self) -> f64 {
        self.capacity_ah
    }

    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    pub fn v_min(&self) -> f64 {
        self.v_min
    }

    /// Cell temperature [K].
    pub fn temperature(&self) -> f64 {
        self.temp_k
    }

    /// Set the cell temperature and cascade it to both electrodes.
    pub fn set_temperature(&mut self, temp_k: f64) -> CellResult<()> {
        ensure_positive(temp_k, "cell temperature")?;
        self.temp_k = temp_k;
        self.positive.set_temperature(temp_k);
        self.negative.set_temperature(temp_k);
        Ok(())
    }

    /// Ambient temperature, fixed at the initial cell temperature.
    pub fn ambient_temperature(&self) -> f64 {
        self.ambient_k
    }

    /// Lumped internal resistance [Ω].
    pub fn r_cell(&self) -> f64 {
        self.r_cell
    }

    pub fn r_cell_init(&self) -> f64 {
        self.r_cell_init
    }

    /// Add film resistance (SEI growth) to the internal resistance.
    pub fn add_resistance(&mut self, delta_ohm: f64) -> CellResult<()> {
        let r = ensure_finite(self.r_cell + delta_ohm, "cell resistance")?;
        debug!(r_cell = r, delta_ohm, "cell resistance updated");
        self.r_cell = r;
        Ok(())
    }

    /// Open-circuit voltage OCP_p - OCP_n [V].
    pub fn ocv(&self) -> f64 {
        self.positive.ocp() - self.negative.ocp()
    }
}

#[cfg(test)]
mod tests {
    use crate::presets::preset;

    #[test]
    fn internal_resistance_from_layer_conductivities() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let expected = (70e-6 / (10.0 * 0.49_f64.powf(1.5))
            + 25e-6 / (0.2875 * 0.724_f64.powf(1.5))
            + 73.5e-6 / (100.0 * 0.4824_f64.powf(1.5)))
            / 0.0596;
        assert!((cell.r_cell() - expected).abs() < 1e-12);
        assert!((cell.r_cell() - 2.7476e-3).abs() < 1e-6);
    }

    #[test]
    fn temperature_cascades_to_electrodes() {
        let mut cell = preset("guo_2011").unwrap().default_cell().unwrap();
        cell.set_temperature(310.0).unwrap();
        assert_eq!(cell.positive().temperature(), 310.0);
        assert_eq!(cell.negative().temperature(), 310.0);
        assert_eq!(cell.ambient_temperature(), 298.15);
        assert!(cell.set_temperature(0.0).is_err());
    }

    #[test]
    fn clone_is_independent() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let mut copy = cell.clone();
        copy.add_resistance(1e-3).unwrap();
        copy.electrode_mut(crate::ElectrodeRole::Positive)
            .set_soc(0.9)
            .unwrap();
        assert!(cell.r_cell() < copy.r_cell());
        assert!(cell.positive().soc() != 0.9);
    }

    #[test]
    fn ocv_in_lco_graphite_window() {
        let cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let ocv = cell.ocv();
        assert!(ocv > 3.5 && ocv < 4.3, "ocv {ocv}");
    }
}
