//! Electrode role tag.

use crate::error::CellError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of the cell an electrode sits on.
///
/// The role fixes the sign convention: for the same applied cell current the
/// negative electrode sees the opposite molar flux of the positive one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectrodeRole {
    #[serde(alias = "p")]
    Positive,
    #[serde(alias = "n")]
    Negative,
}

impl ElectrodeRole {
    /// Sign applied to I/(F S) to get the molar flux at the particle surface.
    #[inline]
    pub fn flux_sign(self) -> f64 {
        match self {
            ElectrodeRole::Positive => 1.0,
            ElectrodeRole::Negative => -1.0,
        }
    }

    /// Short tag used in logs and tables.
    pub fn tag(self) -> &'static str {
        match self {
            ElectrodeRole::Positive => "p",
            ElectrodeRole::Negative => "n",
        }
    }
}

impl fmt::Display for ElectrodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElectrodeRole::Positive => write!(f, "positive"),
            ElectrodeRole::Negative => write!(f, "negative"),
        }
    }
}

impl FromStr for ElectrodeRole {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "positive" | "pos" => Ok(ElectrodeRole::Positive),
            "n" | "negative" | "neg" => Ok(ElectrodeRole::Negative),
            _ => Err(CellError::InvalidElectrodeType { tag: s.to_string() }),
        }
    }
}
