//! Electrode record with Arrhenius-corrected transport and guarded SOC.

use crate::error::{CellError, CellResult};
use crate::ocp::OcpCurve;
use crate::role::ElectrodeRole;
use serde::{Deserialize, Serialize};
use sp_core::{FARADAY, GAS_CONSTANT, ensure_finite, ensure_positive, in_open_unit_interval};
use std::sync::Arc;

/// Static electrode parameters as found in a parameter set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeParams {
    /// Electrode thickness [m]
    pub thickness_m: f64,
    /// Electrode plate area [m²]
    pub area_m2: f64,
    /// Ionic conductivity [S/m]
    pub kappa: f64,
    /// Active material volume fraction
    pub epsilon: f64,
    /// Maximum lithium concentration in the particle [mol/m³]
    pub max_conc: f64,
    /// Particle radius [m]
    pub radius_m: f64,
    /// Electroactive area [m²]; derived from 3εAL/R when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_area_m2: Option<f64>,
    /// Reference temperature for D_ref and k_ref [K]
    pub t_ref_k: f64,
    /// Diffusivity at T_ref [m²/s]
    pub d_ref: f64,
    /// Reaction rate constant at T_ref [m^2.5/(mol^0.5 s)]
    pub k_ref: f64,
    /// Activation energy of diffusion [J/mol]
    pub ea_d: f64,
    /// Activation energy of reaction [J/mol]
    pub ea_r: f64,
    /// Anodic charge transfer coefficient
    pub alpha: f64,
    /// Bruggeman exponent
    pub brugg: f64,
}

impl ElectrodeParams {
    pub fn validate(&self) -> CellResult<()> {
        ensure_positive(self.thickness_m, "electrode thickness")?;
        ensure_positive(self.area_m2, "electrode area")?;
        ensure_positive(self.kappa, "electrode conductivity")?;
        ensure_positive(self.max_conc, "electrode max concentration")?;
        ensure_positive(self.radius_m, "particle radius")?;
        ensure_positive(self.t_ref_k, "electrode reference temperature")?;
        ensure_positive(self.d_ref, "reference diffusivity")?;
        ensure_positive(self.k_ref, "reference rate constant")?;
        ensure_finite(self.ea_d, "diffusion activation energy")?;
        ensure_finite(self.ea_r, "reaction activation energy")?;
        ensure_finite(self.brugg, "electrode Bruggeman exponent")?;
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(CellError::InvalidParameter {
                what: "electrode volume fraction",
                value: self.epsilon,
            });
        }
        if !in_open_unit_interval(self.alpha) {
            return Err(CellError::InvalidParameter {
                what: "charge transfer coefficient",
                value: self.alpha,
            });
        }
        if let Some(s) = self.active_area_m2 {
            ensure_positive(s, "electroactive area")?;
        }
        Ok(())
    }

    /// Electroactive area S [m²].
    pub fn active_area(&self) -> f64 {
        self.active_area_m2
            .unwrap_or(3.0 * self.epsilon * self.area_m2 * self.thickness_m / self.radius_m)
    }
}

/// A single electrode: parameters, OCP curve, and mutable SOC/temperature.
#[derive(Clone, Debug)]
pub struct Electrode {
    role: ElectrodeRole,
    params: ElectrodeParams,
    active_area: f64,
    ocp: Arc<dyn OcpCurve>,
    soc: f64,
    soc_init: f64,
    temp_k: f64,
}

impl Electrode {
    pub fn new(
        role: ElectrodeRole,
        params: ElectrodeParams,
        ocp: Arc<dyn OcpCurve>,
        soc_init: f64,
        temp_k: f64,
    ) -> CellResult<Self> {
        params.validate()?;
        ensure_positive(temp_k, "electrode temperature")?;
        if !in_open_unit_interval(soc_init) {
            return Err(CellError::InvalidSoc {
                role,
                value: soc_init,
            });
        }
        let active_area = params.active_area();
        Ok(Self {
            role,
            params,
            active_area,
            ocp,
            soc: soc_init,
            soc_init,
            temp_k,
        })
    }

    pub fn role(&self) -> ElectrodeRole {
        self.role
    }

    pub fn params(&self) -> &ElectrodeParams {
        &self.params
    }

    pub fn ocp_curve(&self) -> &Arc<dyn OcpCurve> {
        &self.ocp
    }

    /// Current surface SOC.
    pub fn soc(&self) -> f64 {
        self.soc
    }

    pub fn soc_init(&self) -> f64 {
        self.soc_init
    }

    /// Assign a new surface SOC. Values outside the open interval (0, 1) are
    /// rejected and leave the electrode unchanged.
    pub fn set_soc(&mut self, soc: f64) -> CellResult<()> {
        if !in_open_unit_interval(soc) {
            return Err(CellError::InvalidSoc {
                role: self.role,
                value: soc,
            });
        }
        self.soc = soc;
        Ok(())
    }

    pub fn temperature(&self) -> f64 {
        self.temp_k
    }

    /// Only the owning cell moves electrode temperature, so the two electrodes
    /// never disagree with the cell.
    pub(crate) fn set_temperature(&mut self, temp_k: f64) {
        self.temp_k = temp_k;
    }

    pub fn radius(&self) -> f64 {
        self.params.radius_m
    }

    pub fn max_conc(&self) -> f64 {
        self.params.max_conc
    }

    pub fn active_area(&self) -> f64 {
        self.active_area
    }

    pub fn plate_area(&self) -> f64 {
        self.params.area_m2
    }

    pub fn thickness(&self) -> f64 {
        self.params.thickness_m
    }

    /// Solid diffusivity D(T) [m²/s].
    pub fn diffusivity(&self) -> f64 {
        let p = &self.params;
        p.d_ref * (-p.ea_d / GAS_CONSTANT * (1.0 / self.temp_k - 1.0 / p.t_ref_k)).exp()
    }

    /// Reaction rate constant k(T).
    pub fn rate_constant(&self) -> f64 {
        let p = &self.params;
        p.k_ref * (p.ea_r / GAS_CONSTANT * (1.0 / p.t_ref_k - 1.0 / self.temp_k)).exp()
    }

    /// Entropic coefficient dU/dT at the current SOC [V/K].
    pub fn docp_dt(&self) -> f64 {
        self.ocp.slope_wrt_temp(self.soc)
    }

    /// Open-circuit potential at the current SOC and temperature [V].
    pub fn ocp(&self) -> f64 {
        self.ocp.value(self.soc) + self.docp_dt() * (self.temp_k - self.params.t_ref_k)
    }

    /// Effective ionic conductivity κ·ε^brugg [S/m].
    pub fn kappa_eff(&self) -> f64 {
        self.params.kappa * self.params.epsilon.powf(self.params.brugg)
    }

    /// Molar flux at the particle surface [mol/(m² s)] for applied current `i_app`.
    pub fn molar_flux(&self, i_app: f64) -> f64 {
        self.role.flux_sign() * i_app / (FARADAY * self.active_area)
    }

    /// Convert a molar flux back to the current that carries it [A].
    pub fn flux_to_current(&self, molar_flux: f64) -> f64 {
        self.role.flux_sign() * molar_flux * FARADAY * self.active_area
    }

    /// Exchange flux density k c_max √c_e √(1-x) √x [mol/(m² s)].
    pub fn exchange_flux(&self, c_e: f64) -> f64 {
        self.rate_constant()
            * self.params.max_conc
            * c_e.sqrt()
            * (1.0 - self.soc).sqrt()
            * self.soc.sqrt()
    }
}
