//! Battery cell aggregate for the single particle model.
//!
//! A [`BatteryCell`] owns two [`Electrode`]s (tagged by [`ElectrodeRole`]), an
//! [`Electrolyte`], lumped thermal parameters and optional SEI properties.
//! Open-circuit potentials are supplied through the [`OcpCurve`] capability.

pub mod cell;
pub mod electrode;
pub mod electrolyte;
pub mod error;
pub mod ocp;
pub mod presets;
pub mod role;

pub use cell::{BatteryCell, CellParams, SeiProperties, ThermalParams};
pub use electrode::{Electrode, ElectrodeParams};
pub use electrolyte::{Electrolyte, ElectrolyteParams};
pub use error::{CellError, CellResult};
pub use ocp::{LcoGuo2011, McmbGuo2011, OcpCurve, OcpKind, TabulatedOcp};
pub use presets::{PRESET_NAMES, Preset, preset};
pub use role::ElectrodeRole;
