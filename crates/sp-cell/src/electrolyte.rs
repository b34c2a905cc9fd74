//! Electrolyte phase.

use crate::error::{CellError, CellResult};
use serde::{Deserialize, Serialize};
use sp_core::{ensure_finite, ensure_positive};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectrolyteParams {
    /// Separator thickness [m]
    pub thickness_m: f64,
    /// Initial salt concentration [mol/m³]
    pub conc: f64,
    /// Ionic conductivity [S/m]
    pub kappa: f64,
    /// Electrolyte volume fraction in the separator
    pub epsilon: f64,
    /// Bruggeman exponent
    pub brugg: f64,
}

#[derive(Clone, Debug)]
pub struct Electrolyte {
    params: ElectrolyteParams,
    conc: f64,
}

impl Electrolyte {
    pub fn new(params: ElectrolyteParams) -> CellResult<Self> {
        ensure_positive(params.thickness_m, "separator thickness")?;
        ensure_positive(params.conc, "electrolyte concentration")?;
        ensure_positive(params.kappa, "electrolyte conductivity")?;
        ensure_positive(params.epsilon, "electrolyte volume fraction")?;
        ensure_finite(params.brugg, "electrolyte Bruggeman exponent")?;
        let conc = params.conc;
        Ok(Self { params, conc })
    }

    pub fn params(&self) -> &ElectrolyteParams {
        &self.params
    }

    pub fn thickness(&self) -> f64 {
        self.params.thickness_m
    }

    /// Current salt concentration [mol/m³].
    pub fn conc(&self) -> f64 {
        self.conc
    }

    /// Update the concentration; it must stay positive for the kinetics to hold.
    pub fn set_conc(&mut self, conc: f64) -> CellResult<()> {
        if !(conc.is_finite() && conc > 0.0) {
            return Err(CellError::InvalidParameter {
                what: "electrolyte concentration",
                value: conc,
            });
        }
        self.conc = conc;
        Ok(())
    }

    /// Effective conductivity κ·ε^brugg [S/m].
    pub fn kappa_eff(&self) -> f64 {
        self.params.kappa * self.params.epsilon.powf(self.params.brugg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ElectrolyteParams {
        ElectrolyteParams {
            thickness_m: 25e-6,
            conc: 1000.0,
            kappa: 0.2875,
            epsilon: 0.724,
            brugg: 1.5,
        }
    }

    #[test]
    fn kappa_eff_uses_bruggeman() {
        let e = Electrolyte::new(params()).unwrap();
        assert!((e.kappa_eff() - 0.2875 * 0.724_f64.powf(1.5)).abs() < 1e-15);
    }

    #[test]
    fn depletion_below_zero_is_rejected() {
        let mut e = Electrolyte::new(params()).unwrap();
        assert!(e.set_conc(-1.0).is_err());
        assert_eq!(e.conc(), 1000.0);
        e.set_conc(999.5).unwrap();
        assert_eq!(e.conc(), 999.5);
    }
}
