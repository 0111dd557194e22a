//! # Openings
//!
//! Doors, windows and other punched elements. An opening belongs to at most
//! one wall surface and optionally to one space; its area feeds the deduction
//! rules of wall finishes.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::round_to;

/// Derived opening area. Never hand-edited.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OpeningGeometry {
    pub area_m2: f64,
}

fn default_qty() -> u32 {
    1
}

/// A punched opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_surface_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// "door", "window", "vent", ...
    #[serde(rename = "type")]
    pub opening_type: String,
    pub width_m: f64,
    pub height_m: f64,
    #[serde(default = "default_qty")]
    pub qty: u32,
    #[serde(default)]
    pub computed: OpeningGeometry,
}

impl Opening {
    /// Recompute `computed.area_m2`; width and height must not be negative.
    pub fn recompute(&mut self) -> CalcResult<()> {
        for (field, value) in [("width_m", self.width_m), ("height_m", self.height_m)] {
            if value < 0.0 || !value.is_finite() {
                return Err(CalcError::invalid_dimension(field, value, "Opening dimensions cannot be negative"));
            }
        }
        self.computed.area_m2 = compute_opening_area(self.width_m, self.height_m, self.qty);
        Ok(())
    }
}

/// `width × height × qty`, rounded to 3 decimals.
///
/// ```rust
/// use takeoff_core::geometry::compute_opening_area;
///
/// assert_eq!(compute_opening_area(0.9, 2.1, 1), 1.89);
/// assert_eq!(compute_opening_area(1.0, 2.0, 0), 0.0);
/// ```
pub fn compute_opening_area(width_m: f64, height_m: f64, qty: u32) -> f64 {
    round_to(width_m * height_m * f64::from(qty), 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_area() {
        assert_eq!(compute_opening_area(0.9, 2.1, 1), 1.89);
        assert_eq!(compute_opening_area(1.2, 1.5, 3), 5.4);
        assert_eq!(compute_opening_area(1.0, 2.0, 0), 0.0);
    }

    #[test]
    fn test_opening_json_defaults() {
        let mut opening: Opening =
            serde_json::from_str(r#"{"id":"D1","wall_surface_id":"W1","type":"door","width_m":0.9,"height_m":2.1}"#)
                .unwrap();
        assert_eq!(opening.qty, 1);
        assert!(opening.space_id.is_none());
        opening.recompute().unwrap();
        assert_eq!(opening.computed.area_m2, 1.89);
    }

    #[test]
    fn test_negative_dimension_rejected() {
        let mut opening = Opening {
            id: "W1".into(),
            wall_surface_id: None,
            space_id: Some("S1".into()),
            opening_type: "window".into(),
            width_m: -1.0,
            height_m: 1.2,
            qty: 1,
            computed: OpeningGeometry::default(),
        };
        assert!(matches!(opening.recompute(), Err(CalcError::InvalidDimension { .. })));
    }
}
