//! # Units and Rounding
//!
//! Quantities are plain `f64` values in SI units (m, m², m³, kg). This module
//! holds the unit tags carried on takeoff lines and the rounding policy that
//! every quantity derivation applies as its final step.
//!
//! ## Rounding
//!
//! Rounding happens once, at the end of a derivation. Intermediate values
//! (gross area, deductions, waste multiplier) are kept at full precision so
//! that two rounding passes never compound.
//!
//! ```rust
//! use takeoff_core::units::{round_to, format_fixed};
//!
//! assert_eq!(round_to(31.49999, 3), 31.5);
//! assert_eq!(format_fixed(31.5, 2), "31.50");
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Default number of decimal places when a finish type or calculation does
/// not specify one.
pub const DEFAULT_ROUNDING: u32 = 3;

/// Most decimal places a quantity can carry; beyond this `f64` has no digits left.
pub const MAX_ROUNDING: u32 = 15;

/// Check a configured number of decimal places against [`MAX_ROUNDING`].
pub fn validate_rounding(field: &str, decimals: u32) -> CalcResult<u32> {
    if decimals > MAX_ROUNDING {
        return Err(CalcError::invalid_input(
            field,
            decimals.to_string(),
            format!("Rounding must be between 0 and {} decimal places", MAX_ROUNDING),
        ));
    }
    Ok(decimals)
}

/// Unit of measure for a takeoff quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Unit {
    /// Linear meters
    #[serde(rename = "m")]
    Meter,
    /// Square meters
    #[serde(rename = "m2")]
    SquareMeter,
    /// Cubic meters
    #[serde(rename = "m3")]
    CubicMeter,
    /// Kilograms
    #[serde(rename = "kg")]
    Kilogram,
    /// Counted items
    #[serde(rename = "pcs")]
    Each,
    /// Lump sum
    #[serde(rename = "ls")]
    LumpSum,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::SquareMeter => "m²",
            Unit::CubicMeter => "m³",
            Unit::Kilogram => "kg",
            Unit::Each => "pcs",
            Unit::LumpSum => "l.s.",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Round `value` to `decimals` places (half away from zero).
///
/// Negative zero is normalized to zero so formatted output never shows "-0.000".
/// `decimals` above [`MAX_ROUNDING`] is treated as [`MAX_ROUNDING`].
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_ROUNDING) as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format `value` with exactly `decimals` places.
pub fn format_fixed(value: f64, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, round_to(value, decimals))
}

/// Format an input value for formula text using its shortest exact representation.
pub fn format_input(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

/// Format a fractional waste allowance as a percentage ("0.05" -> "5%").
pub fn format_percent(fraction: f64) -> String {
    format!("{}%", format_input(round_to(fraction * 100.0, 6)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(1.23456, 0), 1.0);
        assert_eq!(round_to(-0.0001, 3), 0.0);
        assert_eq!(round_to(1.89, 3), 1.89);
    }

    #[test]
    fn test_round_to_large_decimals_stays_finite() {
        assert_eq!(round_to(31.5, 400), 31.5);
        assert_eq!(round_to(2.25, u32::MAX), 2.25);
    }

    #[test]
    fn test_validate_rounding() {
        assert_eq!(validate_rounding("rounding", 0).unwrap(), 0);
        assert_eq!(validate_rounding("rounding", MAX_ROUNDING).unwrap(), MAX_ROUNDING);
        assert!(matches!(
            validate_rounding("rounding", 16),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_format_fixed_matches_decimals() {
        assert_eq!(format_fixed(30.0, 3), "30.000");
        assert_eq!(format_fixed(30.0, 0), "30");
        assert_eq!(format_fixed(1.005, 2).split('.').nth(1).unwrap().len(), 2);
    }

    #[test]
    fn test_format_inputs() {
        assert_eq!(format_input(5.0), "5");
        assert_eq!(format_input(2.5), "2.5");
        assert_eq!(format_percent(0.05), "5%");
        assert_eq!(format_percent(0.125), "12.5%");
    }

    #[test]
    fn test_unit_serialization() {
        let json = serde_json::to_string(&Unit::SquareMeter).unwrap();
        assert_eq!(json, "\"m2\"");
    }
}
