//! Error types for cell construction and state updates.

use crate::role::ElectrodeRole;
use sp_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("Invalid SOC {value} for {role} electrode (must lie strictly inside (0, 1))")]
    InvalidSoc { role: ElectrodeRole, value: f64 },

    #[error("Invalid electrode type '{tag}' (expected 'p' or 'n')")]
    InvalidElectrodeType { tag: String },

    #[error("Invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Invalid OCP table: {what}")]
    InvalidTable { what: String },

    #[error("Unknown parameter preset '{name}'")]
    UnknownPreset { name: String },

    #[error("Numeric error: {0}")]
    Core(#[from] CoreError),
}

pub type CellResult<T> = Result<T, CellError>;
