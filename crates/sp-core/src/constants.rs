//! Physical constants used by the electrochemical and thermal models.
//!
//! Values match the parameter sets the model was calibrated with, so they are
//! intentionally not the CODATA values.

/// Faraday constant [C/mol]
pub const FARADAY: f64 = 96_487.0;

/// Universal gas constant [J/(mol K)]
pub const GAS_CONSTANT: f64 = 8.3145;

/// 0 °C expressed in kelvin
pub const ZERO_CELSIUS_K: f64 = 273.15;

/// Seconds per hour, for A·s to A·h conversions
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Thermal voltage factor 2RT/F [V] at temperature `temp_k`.
#[inline]
pub fn two_rt_over_f(temp_k: f64) -> f64 {
    2.0 * GAS_CONSTANT * temp_k / FARADAY
}
