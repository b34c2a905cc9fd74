//! Open-circuit potential curves.
//!
//! An [`OcpCurve`] maps electrode SOC to the reference open-circuit potential
//! and its temperature derivative. The electrode combines both as
//! `U(soc, T) = U_ref(soc) + dU/dT(soc) * (T - T_ref)`.

use crate::error::{CellError, CellResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Open-circuit potential capability supplied per electrode.
pub trait OcpCurve: fmt::Debug + Send + Sync {
    /// Curve identifier used in logs and manifests.
    fn name(&self) -> &str;

    /// Reference open-circuit potential [V].
    fn value(&self, soc: f64) -> f64;

    /// Entropic coefficient dU/dT [V/K].
    fn slope_wrt_temp(&self, soc: f64) -> f64;
}

/// LiCoO2 positive electrode fit (Guo et al., 2011).
#[derive(Clone, Copy, Debug, Default)]
pub struct LcoGuo2011;

impl OcpCurve for LcoGuo2011 {
    fn name(&self) -> &str {
        "lco_guo_2011"
    }

    fn value(&self, x: f64) -> f64 {
        let x2 = x * x;
        let x4 = x2 * x2;
        let x6 = x4 * x2;
        let x8 = x4 * x4;
        let x10 = x8 * x2;
        let num = -4.656 + 88.669 * x2 - 401.119 * x4 + 342.909 * x6 - 462.471 * x8
            + 433.434 * x10;
        let den = -1.0 + 18.933 * x2 - 79.532 * x4 + 37.311 * x6 - 73.083 * x8 + 95.96 * x10;
        num / den
    }

    fn slope_wrt_temp(&self, x: f64) -> f64 {
        let num = 0.199521039 - 0.928373822 * x + 1.364550689000003 * x.powi(2)
            - 0.6115448939999998 * x.powi(3);
        let den = 1.0 - 5.661479886999997 * x + 11.47636191 * x.powi(2)
            - 9.82431213599998 * x.powi(3)
            + 3.048755063 * x.powi(4);
        -0.001 * num / den
    }
}

/// MCMB graphite negative electrode fit (Guo et al., 2011).
#[derive(Clone, Copy, Debug, Default)]
pub struct McmbGuo2011;

impl OcpCurve for McmbGuo2011 {
    fn name(&self) -> &str {
        "mcmb_guo_2011"
    }

    fn value(&self, x: f64) -> f64 {
        0.7222 + 0.1387 * x + 0.029 * x.sqrt() - 0.0172 / x + 0.0019 / x.powf(1.5)
            + 0.2808 * (0.9 - 15.0 * x).exp()
            - 0.7984 * (0.4465 * x - 0.4108).exp()
    }

    fn slope_wrt_temp(&self, x: f64) -> f64 {
        const NUM: [f64; 9] = [
            0.005269056,
            3.299265709,
            -91.79325798,
            1004.911008,
            -5812.278127,
            19329.7549,
            -37147.8947,
            38379.18127,
            -16515.05308,
        ];
        const DEN: [f64; 9] = [
            1.0,
            -48.09287227,
            1017.234804,
            -10481.80419,
            59431.3,
            -195881.6488,
            374577.3152,
            -385821.1607,
            165705.8597,
        ];
        0.001 * horner(&NUM, x) / horner(&DEN, x)
    }
}

/// Evaluate sum(c[i] * x^i).
fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Piecewise-linear OCP table with flat extrapolation outside the SOC range.
#[derive(Clone, Debug, PartialEq)]
pub struct TabulatedOcp {
    name: String,
    soc: Vec<f64>,
    ocp: Vec<f64>,
    docp_dt: Vec<f64>,
}

impl TabulatedOcp {
    /// `docp_dt` may be empty, in which case the entropic term is zero.
    pub fn new(
        name: impl Into<String>,
        soc: Vec<f64>,
        ocp: Vec<f64>,
        docp_dt: Vec<f64>,
    ) -> CellResult<Self> {
        if soc.len() < 2 {
            return Err(CellError::InvalidTable {
                what: format!("need at least 2 SOC points, got {}", soc.len()),
            });
        }
        if ocp.len() != soc.len() {
            return Err(CellError::InvalidTable {
                what: format!("ocp has {} points but soc has {}", ocp.len(), soc.len()),
            });
        }
        if !docp_dt.is_empty() && docp_dt.len() != soc.len() {
            return Err(CellError::InvalidTable {
                what: format!(
                    "docp_dt has {} points but soc has {}",
                    docp_dt.len(),
                    soc.len()
                ),
            });
        }
        if soc.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(CellError::InvalidTable {
                what: "soc must be strictly increasing".to_string(),
            });
        }
        if soc.iter().chain(&ocp).chain(&docp_dt).any(|v| !v.is_finite()) {
            return Err(CellError::InvalidTable {
                what: "table contains non-finite values".to_string(),
            });
        }
        Ok(Self {
            name: name.into(),
            soc,
            ocp,
            docp_dt,
        })
    }
}

/// Linear interpolation on a strictly increasing grid, flat beyond the ends.
fn interp_flat(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    // first index with xs[i] > x, guaranteed in 1..n
    let i = xs.partition_point(|&v| v <= x);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

impl OcpCurve for TabulatedOcp {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, soc: f64) -> f64 {
        interp_flat(&self.soc, &self.ocp, soc)
    }

    fn slope_wrt_temp(&self, soc: f64) -> f64 {
        if self.docp_dt.is_empty() {
            0.0
        } else {
            interp_flat(&self.soc, &self.docp_dt, soc)
        }
    }
}

/// Serializable OCP selection used by parameter files and presets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OcpKind {
    LcoGuo2011,
    McmbGuo2011,
    Tabulated {
        #[serde(default = "default_table_name")]
        name: String,
        soc: Vec<f64>,
        ocp: Vec<f64>,
        #[serde(default)]
        docp_dt: Vec<f64>,
    },
}

fn default_table_name() -> String {
    "tabulated".to_string()
}

impl OcpKind {
    pub fn build(&self) -> CellResult<Arc<dyn OcpCurve>> {
        Ok(match self {
            OcpKind::LcoGuo2011 => Arc::new(LcoGuo2011),
            OcpKind::McmbGuo2011 => Arc::new(McmbGuo2011),
            OcpKind::Tabulated {
                name,
                soc,
                ocp,
                docp_dt,
            } => Arc::new(TabulatedOcp::new(
                name.clone(),
                soc.clone(),
                ocp.clone(),
                docp_dt.clone(),
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lco_in_expected_window() {
        let c = LcoGuo2011;
        for x in [0.5, 0.6, 0.7, 0.8, 0.9] {
            let u = c.value(x);
            assert!(u > 3.8 && u < 4.3, "LCO OCP({x}) = {u}");
        }
        // lithiating the cathode lowers its potential
        assert!(c.value(0.9) < c.value(0.5));
    }

    #[test]
    fn mcmb_in_expected_window() {
        let c = McmbGuo2011;
        for x in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let u = c.value(x);
            assert!(u > 0.0 && u < 0.6, "MCMB OCP({x}) = {u}");
        }
        assert!(c.value(0.05) > c.value(0.7));
    }

    #[test]
    fn entropic_coefficients_are_small() {
        for x in [0.3, 0.5, 0.7, 0.9] {
            assert!(LcoGuo2011.slope_wrt_temp(x).abs() < 2e-3);
            assert!(McmbGuo2011.slope_wrt_temp(x).abs() < 2e-3);
        }
    }

    #[test]
    fn horner_matches_direct_sum() {
        let c = [1.0, -2.0, 3.0];
        assert_eq!(horner(&c, 2.0), 1.0 - 4.0 + 12.0);
    }

    #[test]
    fn table_interpolates_and_holds_ends() {
        let t = TabulatedOcp::new("t", vec![0.0, 0.5, 1.0], vec![3.0, 3.5, 4.5], vec![]).unwrap();
        assert!((t.value(0.25) - 3.25).abs() < 1e-12);
        assert!((t.value(0.75) - 4.0).abs() < 1e-12);
        assert_eq!(t.value(-1.0), 3.0);
        assert_eq!(t.value(2.0), 4.5);
        assert_eq!(t.value(0.5), 3.5);
        assert_eq!(t.slope_wrt_temp(0.3), 0.0);
    }

    #[test]
    fn table_rejects_bad_grids() {
        assert!(TabulatedOcp::new("t", vec![0.0], vec![3.0], vec![]).is_err());
        assert!(TabulatedOcp::new("t", vec![0.0, 0.0], vec![3.0, 3.1], vec![]).is_err());
        assert!(TabulatedOcp::new("t", vec![0.0, 1.0], vec![3.0], vec![]).is_err());
        assert!(TabulatedOcp::new("t", vec![0.0, 1.0], vec![3.0, 4.0], vec![0.0]).is_err());
    }

    #[test]
    fn kind_builds_named_curves() {
        let curve = OcpKind::McmbGuo2011.build().unwrap();
        assert_eq!(curve.name(), "mcmb_guo_2011");
        let yaml_like = r#"{"type":"tabulated","soc":[0.0,1.0],"ocp":[0.1,0.2]}"#;
        let kind: OcpKind = serde_json::from_str(yaml_like).unwrap();
        let curve = kind.build().unwrap();
        assert!((curve.value(0.5) - 0.15).abs() < 1e-12);
    }
}
