//! # Opening Deductions
//!
//! Openings hosted by the target surface are deducted from a wall finish
//! when their type is included and their area reaches the rule's minimum.
//! The minimum keeps small vents and sleeves in the quantity, as paper
//! estimates do.

use serde::{Deserialize, Serialize};

use super::DeductionRule;
use crate::geometry::Opening;

/// The surface whose openings are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductionTarget<'a> {
    Space(&'a str),
    WallSurface(&'a str),
}

impl DeductionTarget<'_> {
    fn hosts(&self, opening: &Opening) -> bool {
        match self {
            DeductionTarget::Space(id) => opening.space_id.as_deref() == Some(*id),
            DeductionTarget::WallSurface(id) => opening.wall_surface_id.as_deref() == Some(*id),
        }
    }
}

/// Openings that qualified for deduction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeductionSummary {
    pub opening_ids: Vec<String>,
    pub count: usize,
    /// Sum of qualifying `computed.area_m2` (unrounded)
    pub total_area_m2: f64,
}

/// Filter `openings` by target, type and minimum area, and sum their areas.
///
/// A disabled rule deducts nothing.
///
/// ```rust
/// use takeoff_core::finishes::{compute_opening_deductions, DeductionRule, DeductionTarget};
/// use takeoff_core::geometry::{Opening, OpeningGeometry};
///
/// let door = Opening {
///     id: "D1".into(),
///     wall_surface_id: Some("W1".into()),
///     space_id: None,
///     opening_type: "door".into(),
///     width_m: 0.9,
///     height_m: 2.1,
///     qty: 1,
///     computed: OpeningGeometry { area_m2: 1.89 },
/// };
/// let rule = DeductionRule { enabled: true, min_opening_area_to_deduct_m2: 0.5, include_types: vec![] };
/// let summary = compute_opening_deductions(DeductionTarget::WallSurface("W1"), &[door], &rule);
/// assert_eq!(summary.count, 1);
/// assert_eq!(summary.total_area_m2, 1.89);
/// ```
pub fn compute_opening_deductions(
    target: DeductionTarget<'_>,
    openings: &[Opening],
    rule: &DeductionRule,
) -> DeductionSummary {
    if !rule.enabled {
        return DeductionSummary::default();
    }

    let qualifying: Vec<&Opening> = openings
        .iter()
        .filter(|o| target.hosts(o))
        .filter(|o| {
            rule.include_types.is_empty()
                || rule
                    .include_types
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&o.opening_type))
        })
        .filter(|o| o.computed.area_m2 >= rule.min_opening_area_to_deduct_m2)
        .collect();

    DeductionSummary {
        opening_ids: qualifying.iter().map(|o| o.id.clone()).collect(),
        count: qualifying.len(),
        total_area_m2: qualifying.iter().map(|o| o.computed.area_m2).sum(),
    }
}
