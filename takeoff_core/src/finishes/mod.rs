//! # Finishes
//!
//! Finish types (reusable specifications), their assignments to spaces and
//! wall surfaces, and the calculators that turn an assignment into a
//! takeoff line.
//!
//! - [`deduction`] - opening deduction rule (threshold and type filter)
//! - [`calculator`] - floor, ceiling, perimeter wall and wall surface takeoff
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "id": "FT-PAINT",
//!   "category": "paint",
//!   "finish_name": "Acrylic latex paint, 3 coats",
//!   "dpwh_item_number_raw": "1032 (1) a",
//!   "unit": "m2",
//!   "wall_height_rule": { "mode": "fullHeight" },
//!   "deduction_rule": { "enabled": true, "min_opening_area_to_deduct_m2": 0.5, "include_types": ["door", "window"] },
//!   "assumptions": { "waste_percent": 0.05, "rounding": 2 }
//! }
//! ```

pub mod calculator;
pub mod deduction;

pub use calculator::{ceiling_takeoff, floor_takeoff, wall_surface_takeoff, wall_takeoff};
pub use deduction::{compute_opening_deductions, DeductionSummary, DeductionTarget};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::{validate_rounding, Unit, DEFAULT_ROUNDING};

/// What a finish type covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishCategory {
    Floor,
    Wall,
    Ceiling,
    Plaster,
    Paint,
}

impl FinishCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            FinishCategory::Floor => "floor",
            FinishCategory::Wall => "wall",
            FinishCategory::Ceiling => "ceiling",
            FinishCategory::Plaster => "plaster",
            FinishCategory::Paint => "paint",
        }
    }

    /// Wall, plaster and paint are all taken off on vertical surfaces
    pub fn is_vertical(&self) -> bool {
        matches!(self, FinishCategory::Wall | FinishCategory::Plaster | FinishCategory::Paint)
    }
}

impl std::fmt::Display for FinishCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Height a wall finish is taken up to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum WallHeightRule {
    /// Full storey / wall surface height
    FullHeight,
    /// Fixed height from floor (wainscot, skirting band)
    Fixed { value_m: f64 },
}

/// Which openings are deducted from a wall finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRule {
    pub enabled: bool,
    /// Openings smaller than this are not deducted
    #[serde(default)]
    pub min_opening_area_to_deduct_m2: f64,
    /// Opening types considered; empty means every type
    #[serde(default)]
    pub include_types: Vec<String>,
}

/// Default waste and rounding policy of a finish type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FinishAssumptions {
    /// Fractional waste allowance (0.05 = 5%)
    #[serde(default)]
    pub waste_percent: f64,
    /// Decimal places of the final quantity
    #[serde(default)]
    pub rounding: Option<u32>,
}

/// A reusable finish specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishType {
    pub id: String,
    pub category: FinishCategory,
    pub finish_name: String,
    #[serde(default)]
    pub dpwh_item_number_raw: String,
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_height_rule: Option<WallHeightRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduction_rule: Option<DeductionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<FinishAssumptions>,
}

impl FinishType {
    /// Decimal places: finish type setting, else 3. At most 15.
    pub fn rounding(&self) -> CalcResult<u32> {
        let decimals = self
            .assumptions
            .and_then(|a| a.rounding)
            .unwrap_or(DEFAULT_ROUNDING);
        validate_rounding("assumptions.rounding", decimals)
    }

    /// Waste: assignment override, else finish-type default, else 0
    pub fn effective_waste(&self, overrides: &AssignmentOverrides) -> CalcResult<f64> {
        let waste = overrides
            .waste_percent
            .or_else(|| self.assumptions.map(|a| a.waste_percent))
            .unwrap_or(0.0);
        validate_waste("waste_percent", waste)?;
        Ok(waste)
    }

    /// Pay item number, `None` when blank
    pub fn dpwh_item(&self) -> Option<String> {
        let raw = self.dpwh_item_number_raw.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }
}

/// Waste must be a fraction in [0, 1].
pub(crate) fn validate_waste(field: &str, waste: f64) -> CalcResult<()> {
    if !(0.0..=1.0).contains(&waste) {
        return Err(CalcError::invalid_dimension(field, waste, "Waste must be between 0 and 1"));
    }
    Ok(())
}

/// Per-assignment overrides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssignmentOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waste_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_m: Option<f64>,
    /// Wall surfaces only: finish one or both faces regardless of surface type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sides_count: Option<u8>,
}

fn default_scope() -> String {
    "base".to_string()
}

/// Links a space to a finish type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceFinishAssignment {
    pub id: String,
    pub space_id: String,
    pub finish_type_id: String,
    /// "base", "wainscot", ...
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub overrides: AssignmentOverrides,
}

/// Links a wall surface to a finish type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSurfaceFinishAssignment {
    pub id: String,
    pub wall_surface_id: String,
    pub finish_type_id: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub overrides: AssignmentOverrides,
}
