//! sp-core: shared foundation for the single particle model crates.
//!
//! Contains:
//! - constants (Faraday, gas constant, Kelvin offset)
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float guards)
//! - timing (opt-in wall-clock timers)
//! - error (shared error types)

pub mod constants;
pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;

pub use constants::*;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
