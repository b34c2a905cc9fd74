//! Built-in parameter sets.

use crate::cell::{BatteryCell, CellParams, SeiProperties, ThermalParams};
use crate::electrode::ElectrodeParams;
use crate::electrolyte::ElectrolyteParams;
use crate::error::{CellError, CellResult};
use crate::ocp::OcpKind;

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["guo_2011"];

/// A named parameter set with its OCP curves and default initial state.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub params: CellParams,
    pub ocp_positive: OcpKind,
    pub ocp_negative: OcpKind,
    pub default_soc_p: f64,
    pub default_soc_n: f64,
    pub default_temp_k: f64,
}

impl Preset {
    pub fn build_cell(&self, soc_p: f64, soc_n: f64, temp_k: f64) -> CellResult<BatteryCell> {
        BatteryCell::new(
            self.params.clone(),
            self.ocp_positive.build()?,
            self.ocp_negative.build()?,
            soc_p,
            soc_n,
            temp_k,
        )
    }

    pub fn default_cell(&self) -> CellResult<BatteryCell> {
        self.build_cell(self.default_soc_p, self.default_soc_n, self.default_temp_k)
    }
}

/// Look up a preset by name (case-insensitive).
pub fn preset(name: &str) -> CellResult<Preset> {
    match name.trim().to_ascii_lowercase().as_str() {
        "guo_2011" | "guo2011" | "lco_mcmb" => Ok(guo_2011()),
        _ => Err(CellError::UnknownPreset {
            name: name.to_string(),
        }),
    }
}

/// LiCoO2 / MCMB 18650-class cell of Guo, White et al. (2011).
pub fn guo_2011() -> Preset {
    Preset {
        name: "guo_2011",
        description: "LCO/MCMB 18650-class cell, 1.65 A h",
        params: guo_2011_params(),
        ocp_positive: OcpKind::LcoGuo2011,
        ocp_negative: OcpKind::McmbGuo2011,
        default_soc_p: 0.4956,
        default_soc_n: 0.7568,
        default_temp_k: 298.15,
    }
}

pub fn guo_2011_params() -> CellParams {
    CellParams {
        positive: ElectrodeParams {
            thickness_m: 70e-6,
            area_m2: 0.0596,
            kappa: 10.0,
            epsilon: 0.49,
            max_conc: 51_410.0,
            radius_m: 8.5e-6,
            active_area_m2: Some(1.1167),
            t_ref_k: 298.15,
            d_ref: 1e-14,
            k_ref: 6.6667e-11,
            ea_d: 29_000.0,
            ea_r: 58_000.0,
            alpha: 0.5,
            brugg: 1.5,
        },
        negative: ElectrodeParams {
            thickness_m: 73.5e-6,
            area_m2: 0.0596,
            kappa: 100.0,
            epsilon: 0.4824,
            max_conc: 31_833.0,
            radius_m: 12.5e-6,
            active_area_m2: Some(0.7824),
            t_ref_k: 298.15,
            d_ref: 3.9e-14,
            k_ref: 1.764e-11,
            ea_d: 35_000.0,
            ea_r: 20_000.0,
            alpha: 0.5,
            brugg: 1.5,
        },
        electrolyte: ElectrolyteParams {
            thickness_m: 25e-6,
            conc: 1000.0,
            kappa: 0.2875,
            epsilon: 0.724,
            brugg: 1.5,
        },
        thermal: ThermalParams {
            density: 1626.0,
            volume_m3: 3.38e-5,
            heat_capacity: 750.0,
            h: 1.0,
            surface_area_m2: 0.085,
        },
        sei: Some(SeiProperties {
            u_s: 0.4,
            i_s: 1.5e-6,
            molar_weight: 0.162,
            density: 1690.0,
            kappa: 5e-6,
        }),
        capacity_ah: 1.65,
        v_max: 4.2,
        v_min: 3.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_preset_resolves() {
        for name in PRESET_NAMES {
            let p = preset(name).unwrap();
            assert_eq!(&p.name, name);
            p.default_cell().unwrap();
        }
    }

    #[test]
    fn unknown_preset_is_an_error() {
        assert_eq!(
            preset("nope"),
            Err(CellError::UnknownPreset {
                name: "nope".to_string()
            })
        );
    }
}
