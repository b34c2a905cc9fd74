//! Error types for simulation operations.

use sp_cell::{CellError, ElectrodeRole};
use sp_core::CoreError;
use sp_solver::SolverError;
use thiserror::Error;

/// Errors encountered while simulating a cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid SOC {value} for {role} electrode")]
    InvalidSoc { role: ElectrodeRole, value: f64 },

    #[error("Invalid electrode type '{tag}'")]
    InvalidElectrodeType { tag: String },

    #[error("Terminal voltage {voltage:.4} V crossed cell limit {bound:.4} V")]
    ThresholdPotentialReached { voltage: f64, bound: f64 },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Insufficient configuration: {what}")]
    InsufficientConfig { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what} ({value})")]
    NonPhysical { what: &'static str, value: f64 },

    #[error("Run cancelled at t = {t_s} s")]
    Cancelled { t_s: f64 },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Cell error: {message}")]
    Cell { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Errors that end the current cycling step but leave the run usable.
    pub fn is_step_recoverable(&self) -> bool {
        matches!(
            self,
            SimError::InvalidSoc { .. } | SimError::Solver(_) | SimError::ConvergenceFailed { .. }
        )
    }
}

impl From<CellError> for SimError {
    fn from(e: CellError) -> Self {
        match e {
            CellError::InvalidSoc { role, value } => SimError::InvalidSoc { role, value },
            CellError::InvalidElectrodeType { tag } => SimError::InvalidElectrodeType { tag },
            CellError::InvalidParameter { what, value } => SimError::NonPhysical { what, value },
            CellError::Core(core) => core.into(),
            other => SimError::Cell {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, value } | CoreError::NonPositive { what, value } => {
                SimError::NonPhysical { what, value }
            }
            CoreError::InvalidArg { what } => SimError::InvalidArg { what },
            CoreError::Invariant { what } => SimError::Cell {
                message: what.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_soc_keeps_its_identity() {
        let e: SimError = CellError::InvalidSoc {
            role: ElectrodeRole::Negative,
            value: -1e-4,
        }
        .into();
        assert!(matches!(
            e,
            SimError::InvalidSoc {
                role: ElectrodeRole::Negative,
                ..
            }
        ));
        assert!(e.is_step_recoverable());
    }

    #[test]
    fn unknown_tag_maps_to_invalid_electrode_type() {
        let e: SimError = "q"
            .parse::<ElectrodeRole>()
            .map_err(SimError::from)
            .unwrap_err();
        assert_eq!(
            e,
            SimError::InvalidElectrodeType {
                tag: "q".to_string()
            }
        );
        assert!(!e.is_step_recoverable());
    }
}
