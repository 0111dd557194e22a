//! # Finish Takeoff Calculator
//!
//! Four takeoffs share one pipeline:
//!
//! ```text
//! base quantity ─► deduction (walls) ─► clamp ≥ 0 ─► × (1 + waste) ─► round ─► line
//! ```
//!
//! - **Floor**: the space area.
//! - **Ceiling**: the space area, or zero when the space is open to below.
//! - **Wall (perimeter)**: space perimeter × height. Quick estimate used before
//!   wall surfaces are modeled.
//! - **Wall surface**: modeled wall area × finished sides. Preferred over the
//!   perimeter estimate once wall surfaces exist; callers choose.
//!
//! Waste precedence is assignment override, then finish-type default, then 0.
//! Rounding is the finish type's `rounding`, else 3 decimals, applied once at
//! the end.

use super::deduction::{compute_opening_deductions, DeductionSummary, DeductionTarget};
use super::{FinishType, SpaceFinishAssignment, WallHeightRule, WallSurfaceFinishAssignment};
use crate::errors::{CalcError, CalcResult};
use crate::formulas::Formula;
use crate::geometry::{Opening, Space, WallSurface};
use crate::takeoff::{Assumption, HeightBasis, LineBuilder, TakeoffLine, Trade};
use crate::units::{format_fixed, format_input, round_to};

/// Symbolic and numeric halves of a formula text, assembled step by step.
struct Expression {
    symbolic: String,
    numeric: String,
}

impl Expression {
    fn new(symbolic: impl Into<String>, numeric: impl Into<String>) -> Self {
        Expression {
            symbolic: symbolic.into(),
            numeric: numeric.into(),
        }
    }

    fn minus_deduction(self, deduction: Option<f64>) -> Self {
        match deduction {
            Some(d) => Expression {
                symbolic: format!("max(0, {} − D)", self.symbolic),
                numeric: format!("max(0, {} − {})", self.numeric, format_input(round_to(d, 6))),
            },
            None => self,
        }
    }

    fn with_waste(self, waste: f64) -> Self {
        if waste > 0.0 {
            Expression {
                symbolic: format!("{} × (1 + waste)", self.symbolic),
                numeric: format!("{} × (1 + {})", self.numeric, format_input(waste)),
            }
        } else {
            self
        }
    }

    fn render(&self, label: &str, result: f64, rounding: u32, unit: &str) -> String {
        format!(
            "{} = {} = {} = {} {}",
            label,
            self.symbolic,
            self.numeric,
            format_fixed(result, rounding),
            unit
        )
    }
}

/// Apply waste then round. A zero (or clamped) quantity stays zero.
fn finalize(net: f64, waste: f64, rounding: u32) -> f64 {
    if net <= 0.0 {
        0.0
    } else {
        round_to(net * (1.0 + waste), rounding)
    }
}

fn finish_line(
    source_id: &str,
    finish: &FinishType,
    scope: &str,
    formula: Formula,
    level_id: &str,
    waste: f64,
    rounding: u32,
) -> LineBuilder {
    LineBuilder::new(
        source_id,
        Trade::Finishes,
        format!("finish:{}:{}", finish.id, scope),
        finish.unit,
        formula,
    )
    .tags([
        "finish".to_string(),
        finish.category.display_name().to_string(),
        format!("scope:{}", scope),
    ])
    .dpwh_item(finish.dpwh_item())
    .template(finish.id.clone())
    .level(level_id)
    .input("waste_percent", waste)
    .input("rounding", f64::from(rounding))
}

fn validate_height(field: &str, height_m: f64) -> CalcResult<f64> {
    if !(height_m > 0.0) || !height_m.is_finite() {
        return Err(CalcError::invalid_dimension(field, height_m, "Wall finish height must be positive"));
    }
    Ok(height_m)
}

/// Fixed rule, then assignment override, then the caller's default.
fn resolve_height(
    rule: Option<WallHeightRule>,
    override_m: Option<f64>,
    default_m: f64,
    default_basis: HeightBasis,
) -> CalcResult<(HeightBasis, f64)> {
    let (basis, height) = match (rule, override_m) {
        (Some(WallHeightRule::Fixed { value_m }), _) => (HeightBasis::FixedRule, value_m),
        (_, Some(h)) => (HeightBasis::AssignmentOverride, h),
        _ => (default_basis, default_m),
    };
    Ok((basis, validate_height("height_m", height)?))
}

fn deduction_assumption(finish: &FinishType, summary: &DeductionSummary, multiplier: f64) -> Option<Assumption> {
    finish
        .deduction_rule
        .as_ref()
        .filter(|rule| rule.enabled)
        .map(|rule| Assumption::Deduction {
            min_area_m2: rule.min_opening_area_to_deduct_m2,
            include_types: rule.include_types.clone(),
            count: summary.count,
            total_area_m2: summary.total_area_m2 * multiplier,
        })
}

fn deductions_for(target: DeductionTarget<'_>, finish: &FinishType, openings: &[Opening]) -> Option<DeductionSummary> {
    finish
        .deduction_rule
        .as_ref()
        .filter(|rule| rule.enabled)
        .map(|rule| compute_opening_deductions(target, openings, rule))
}

/// Floor finish: space area with waste.
pub fn floor_takeoff(
    space: &Space,
    finish: &FinishType,
    assignment: &SpaceFinishAssignment,
) -> CalcResult<TakeoffLine> {
    let waste = finish.effective_waste(&assignment.overrides)?;
    let rounding = finish.rounding()?;
    let area = space.computed.area_m2;
    let quantity = finalize(area, waste, rounding);

    let text = Expression::new("A", format_input(area))
        .with_waste(waste)
        .render("Floor area", quantity, rounding, finish.unit.symbol());

    Ok(
        finish_line(&space.id, finish, &assignment.scope, Formula::FloorFinish, &space.level_id, waste, rounding)
            .input("area_m2", area)
            .assume_if(waste > 0.0, Assumption::Waste { percent: waste })
            .formula_text(text)
            .build(quantity),
    )
}

/// Ceiling finish: space area with waste, or zero when open to below.
pub fn ceiling_takeoff(
    space: &Space,
    finish: &FinishType,
    assignment: &SpaceFinishAssignment,
    is_open_to_below: bool,
) -> CalcResult<TakeoffLine> {
    let waste = finish.effective_waste(&assignment.overrides)?;
    let rounding = finish.rounding()?;
    let area = space.computed.area_m2;
    let builder =
        finish_line(&space.id, finish, &assignment.scope, Formula::CeilingFinish, &space.level_id, waste, rounding)
            .input("area_m2", area);

    if is_open_to_below {
        let text = Expression::new("0 (open to below)", "0").render("Ceiling area", 0.0, rounding, finish.unit.symbol());
        return Ok(builder
            .input("open_to_below", 1.0)
            .assume(Assumption::OpenToBelow)
            .formula_text(text)
            .build(0.0));
    }

    let quantity = finalize(area, waste, rounding);
    let text = Expression::new("A", format_input(area))
        .with_waste(waste)
        .render("Ceiling area", quantity, rounding, finish.unit.symbol());

    Ok(builder
        .input("open_to_below", 0.0)
        .assume_if(waste > 0.0, Assumption::Waste { percent: waste })
        .formula_text(text)
        .build(quantity))
}

/// Wall finish estimated from the space perimeter.
///
/// `storey_height_m` is used when neither a fixed height rule nor an
/// assignment override applies. Openings are matched to the space by
/// `space_id`.
pub fn wall_takeoff(
    space: &Space,
    finish: &FinishType,
    assignment: &SpaceFinishAssignment,
    storey_height_m: f64,
    openings: &[Opening],
) -> CalcResult<TakeoffLine> {
    let waste = finish.effective_waste(&assignment.overrides)?;
    let rounding = finish.rounding()?;
    let (basis, height) = resolve_height(
        finish.wall_height_rule,
        assignment.overrides.height_m,
        storey_height_m,
        HeightBasis::StoreyHeight,
    )?;

    let perimeter = space.computed.perimeter_m;
    let gross = perimeter * height;
    let summary = deductions_for(DeductionTarget::Space(&space.id), finish, openings);
    let deducted = summary.as_ref().map(|s| s.total_area_m2);
    let net = (gross - deducted.unwrap_or(0.0)).max(0.0);
    let quantity = finalize(net, waste, rounding);

    let text = Expression::new("P × H", format!("{} × {}", format_input(perimeter), format_input(height)))
        .minus_deduction(deducted)
        .with_waste(waste)
        .render("Wall area", quantity, rounding, finish.unit.symbol());

    let deduction = summary
        .as_ref()
        .and_then(|s| deduction_assumption(finish, s, 1.0));

    let mut builder =
        finish_line(&space.id, finish, &assignment.scope, Formula::PerimeterWallFinish, &space.level_id, waste, rounding)
            .input("perimeter_m", perimeter)
            .input("height_m", height)
            .input("gross_area_m2", gross)
            .input("deduction_m2", deducted.unwrap_or(0.0))
            .input("net_area_m2", net)
            .assume(Assumption::Height { basis, height_m: height });
    if let Some(deduction) = deduction {
        builder = builder.assume(deduction);
    }

    Ok(builder
        .assume_if(waste > 0.0, Assumption::Waste { percent: waste })
        .formula_text(text)
        .build(quantity))
}

/// Wall finish on a modeled wall surface.
///
/// Base area is the surface's gross area times its finished sides (the
/// assignment may force one or two sides). A fixed height rule or a height
/// override replaces the full wall height. Each qualifying opening is
/// deducted once per finished side.
pub fn wall_surface_takeoff(
    wall: &WallSurface,
    finish: &FinishType,
    assignment: &WallSurfaceFinishAssignment,
    openings: &[Opening],
) -> CalcResult<TakeoffLine> {
    let waste = finish.effective_waste(&assignment.overrides)?;
    let rounding = finish.rounding()?;

    let sides = match assignment.overrides.sides_count {
        Some(n @ (1 | 2)) => n,
        Some(n) => {
            return Err(CalcError::invalid_input(
                "sides_count",
                n.to_string(),
                "Sides count must be 1 or 2",
            ))
        }
        None => wall.computed.sides_count,
    };
    let sides_f = f64::from(sides);

    let length = wall.computed.length_m;
    let (basis, height) = resolve_height(
        finish.wall_height_rule,
        assignment.overrides.height_m,
        wall.computed.height_m,
        HeightBasis::WallSurfaceHeight,
    )?;

    let (gross, base_expr) = if basis == HeightBasis::WallSurfaceHeight {
        let area = wall.computed.gross_area_m2;
        (
            area * sides_f,
            Expression::new("A × S", format!("{} × {}", format_input(area), sides)),
        )
    } else {
        (
            length * height * sides_f,
            Expression::new(
                "L × H × S",
                format!("{} × {} × {}", format_input(length), format_input(height), sides),
            ),
        )
    };

    let summary = deductions_for(DeductionTarget::WallSurface(&wall.id), finish, openings);
    let deducted = summary.as_ref().map(|s| s.total_area_m2 * sides_f);
    let net = (gross - deducted.unwrap_or(0.0)).max(0.0);
    let quantity = finalize(net, waste, rounding);

    let text = base_expr
        .minus_deduction(deducted)
        .with_waste(waste)
        .render("Wall surface area", quantity, rounding, finish.unit.symbol());

    let deduction = summary
        .as_ref()
        .and_then(|s| deduction_assumption(finish, s, sides_f));

    let mut builder =
        finish_line(&wall.id, finish, &assignment.scope, Formula::WallSurfaceFinish, &wall.level_start, waste, rounding)
            .input("length_m", length)
            .input("height_m", height)
            .input("sides_count", sides_f)
            .input("gross_area_m2", gross)
            .input("deduction_m2", deducted.unwrap_or(0.0))
            .input("net_area_m2", net)
            .tag(format!("surface:{}", wall.surface_type.display_name()))
            .assume(Assumption::Height { basis, height_m: height })
            .assume(Assumption::Sides {
                count: sides,
                overridden: assignment.overrides.sides_count.is_some(),
            });
    if let Some(deduction) = deduction {
        builder = builder.assume(deduction);
    }

    Ok(builder
        .assume_if(waste > 0.0, Assumption::Waste { percent: waste })
        .formula_text(text)
        .build(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finishes::{AssignmentOverrides, DeductionRule, FinishAssumptions, FinishCategory};
    use crate::geometry::{
        GridRectBoundary, OpeningGeometry, SpaceBoundary, SpaceGeometry, SurfaceType, WallGridLine,
        WallSurfaceGeometry,
    };
    use crate::grid::Axis;
    use crate::units::Unit;

    fn space() -> Space {
        Space {
            id: "S1".into(),
            name: "Office".into(),
            level_id: "L1".into(),
            boundary: SpaceBoundary::GridRect(GridRectBoundary::new(["A", "B"], ["1", "2"])),
            computed: SpaceGeometry { area_m2: 30.0, perimeter_m: 22.0 },
            tags: vec![],
            open_to_below: false,
        }
    }

    fn wall(surface_type: SurfaceType) -> WallSurface {
        let sides = surface_type.sides_count();
        WallSurface {
            id: "W1".into(),
            name: "Grid 1".into(),
            grid_line: WallGridLine::new(Axis::Y, "1", ["A", "C"]),
            level_start: "L1".into(),
            level_end: "L2".into(),
            surface_type,
            facing: None,
            computed: WallSurfaceGeometry {
                length_m: 10.0,
                height_m: 3.0,
                gross_area_m2: 30.0,
                sides_count: sides,
                total_area_m2: 30.0 * f64::from(sides),
            },
        }
    }

    fn finish(category: FinishCategory, waste: f64, rounding: Option<u32>) -> FinishType {
        FinishType {
            id: "FT-1".into(),
            category,
            finish_name: "Test finish".into(),
            dpwh_item_number_raw: "1018 (1)".into(),
            unit: Unit::SquareMeter,
            wall_height_rule: None,
            deduction_rule: None,
            assumptions: Some(FinishAssumptions { waste_percent: waste, rounding }),
        }
    }

    fn space_assignment(overrides: AssignmentOverrides) -> SpaceFinishAssignment {
        SpaceFinishAssignment {
            id: "A1".into(),
            space_id: "S1".into(),
            finish_type_id: "FT-1".into(),
            scope: "base".into(),
            overrides,
        }
    }

    fn wall_assignment(overrides: AssignmentOverrides) -> WallSurfaceFinishAssignment {
        WallSurfaceFinishAssignment {
            id: "WA1".into(),
            wall_surface_id: "W1".into(),
            finish_type_id: "FT-1".into(),
            scope: "base".into(),
            overrides,
        }
    }

    fn opening(id: &str, kind: &str, area: f64) -> Opening {
        Opening {
            id: id.into(),
            wall_surface_id: Some("W1".into()),
            space_id: Some("S1".into()),
            opening_type: kind.into(),
            width_m: 1.0,
            height_m: area,
            qty: 1,
            computed: OpeningGeometry { area_m2: area },
        }
    }

    fn deduct_all(min: f64) -> DeductionRule {
        DeductionRule {
            enabled: true,
            min_opening_area_to_deduct_m2: min,
            include_types: vec![],
        }
    }

    #[test]
    fn test_floor_with_waste() {
        let line = floor_takeoff(&space(), &finish(FinishCategory::Floor, 0.05, None), &space_assignment(Default::default())).unwrap();
        assert_eq!(line.quantity, 31.5);
        assert_eq!(line.formula_text, "Floor area = A × (1 + waste) = 30 × (1 + 0.05) = 31.500 m²");
        assert_eq!(line.assumption_texts(), vec!["Waste allowance: 5%"]);
        assert_eq!(line.dpwh_item_number.as_deref(), Some("1018 (1)"));
        assert_eq!(line.resource_key, "finish:FT-1:base");
    }

    #[test]
    fn test_floor_without_waste_has_no_waste_assumption() {
        let line = floor_takeoff(&space(), &finish(FinishCategory::Floor, 0.0, None), &space_assignment(Default::default())).unwrap();
        assert_eq!(line.quantity, 30.0);
        assert_eq!(line.formula_text, "Floor area = A = 30 = 30.000 m²");
        assert!(line.assumptions.is_empty());
    }

    #[test]
    fn test_assignment_waste_overrides_finish_default() {
        let overrides = AssignmentOverrides { waste_percent: Some(0.1), ..Default::default() };
        let line = floor_takeoff(&space(), &finish(FinishCategory::Floor, 0.05, None), &space_assignment(overrides)).unwrap();
        assert_eq!(line.quantity, 33.0);
    }

    #[test]
    fn test_rounding_from_finish_type() {
        let mut s = space();
        s.computed.area_m2 = 12.3456;
        let line = floor_takeoff(&s, &finish(FinishCategory::Floor, 0.0, Some(1)), &space_assignment(Default::default())).unwrap();
        assert_eq!(line.quantity, 12.3);
        assert!(line.formula_text.ends_with("= 12.3 m²"));
    }

    #[test]
    fn test_excessive_rounding_rejected() {
        let ft = finish(FinishCategory::Floor, 0.0, Some(400));
        let result = floor_takeoff(&space(), &ft, &space_assignment(Default::default()));
        assert!(matches!(result, Err(CalcError::InvalidInput { .. })));
    }

    #[test]
    fn test_ceiling_open_to_below_is_zero() {
        let line = ceiling_takeoff(&space(), &finish(FinishCategory::Ceiling, 0.05, None), &space_assignment(Default::default()), true).unwrap();
        assert_eq!(line.quantity, 0.0);
        assert_eq!(line.assumptions, vec![Assumption::OpenToBelow]);
        assert_eq!(line.formula_text, "Ceiling area = 0 (open to below) = 0 = 0.000 m²");
    }

    #[test]
    fn test_ceiling_normal() {
        let line = ceiling_takeoff(&space(), &finish(FinishCategory::Ceiling, 0.0, None), &space_assignment(Default::default()), false).unwrap();
        assert_eq!(line.quantity, 30.0);
    }

    #[test]
    fn test_wall_perimeter_storey_height_with_deduction() {
        let mut ft = finish(FinishCategory::Paint, 0.0, None);
        ft.deduction_rule = Some(deduct_all(0.5));
        let openings = vec![opening("D1", "door", 1.89), opening("V1", "vent", 0.09)];

        let line = wall_takeoff(&space(), &ft, &space_assignment(Default::default()), 3.0, &openings).unwrap();
        // 22 × 3 − 1.89 = 64.11
        assert!((line.quantity - 64.11).abs() < 1e-9);
        assert_eq!(line.formula_text, "Wall area = max(0, P × H − D) = max(0, 22 × 3 − 1.89) = 64.110 m²");
        let texts = line.assumption_texts();
        assert_eq!(texts[0], "Height basis: storey height (3 m)");
        assert_eq!(texts[1], "Opening deduction: 1 opening(s) of all types at least 0.5 m², total 1.890 m²");
        assert_eq!(texts.len(), 2);
    }

    #[test]
    fn test_wall_height_precedence() {
        let mut ft = finish(FinishCategory::Wall, 0.0, None);
        let overrides = AssignmentOverrides { height_m: Some(2.4), ..Default::default() };

        let line = wall_takeoff(&space(), &ft, &space_assignment(overrides), 3.0, &[]).unwrap();
        assert_eq!(line.inputs_snapshot["height_m"], 2.4);

        ft.wall_height_rule = Some(WallHeightRule::Fixed { value_m: 1.2 });
        let line = wall_takeoff(&space(), &ft, &space_assignment(overrides), 3.0, &[]).unwrap();
        assert_eq!(line.inputs_snapshot["height_m"], 1.2);
        assert_eq!(line.assumptions[0], Assumption::Height { basis: HeightBasis::FixedRule, height_m: 1.2 });
    }

    #[test]
    fn test_wall_net_area_clamped_at_zero() {
        let mut ft = finish(FinishCategory::Wall, 0.1, None);
        ft.deduction_rule = Some(deduct_all(0.0));
        let mut s = space();
        s.computed.perimeter_m = 1.0;
        let openings = vec![opening("D1", "door", 10.0)];

        let line = wall_takeoff(&s, &ft, &space_assignment(Default::default()), 3.0, &openings).unwrap();
        assert_eq!(line.quantity, 0.0);
        assert_eq!(line.inputs_snapshot["net_area_m2"], 0.0);
    }

    #[test]
    fn test_wall_rejects_non_positive_height() {
        let ft = finish(FinishCategory::Wall, 0.0, None);
        let result = wall_takeoff(&space(), &ft, &space_assignment(Default::default()), 0.0, &[]);
        assert!(matches!(result, Err(CalcError::InvalidDimension { .. })));
    }

    #[test]
    fn test_wall_surface_interior_both_sides_deducted() {
        let mut ft = finish(FinishCategory::Plaster, 0.0, Some(2));
        ft.deduction_rule = Some(deduct_all(0.5));
        let openings = vec![opening("D1", "door", 1.89)];

        let line = wall_surface_takeoff(&wall(SurfaceType::Interior), &ft, &wall_assignment(Default::default()), &openings).unwrap();
        // 30 × 2 − 1.89 × 2 = 56.22
        assert_eq!(line.quantity, 56.22);
        assert_eq!(
            line.formula_text,
            "Wall surface area = max(0, A × S − D) = max(0, 30 × 2 − 3.78) = 56.22 m²"
        );
        assert_eq!(line.assumptions[1], Assumption::Sides { count: 2, overridden: false });
    }

    #[test]
    fn test_wall_surface_sides_override_and_fixed_height() {
        let mut ft = finish(FinishCategory::Wall, 0.05, None);
        ft.wall_height_rule = Some(WallHeightRule::Fixed { value_m: 1.5 });
        let overrides = AssignmentOverrides { sides_count: Some(1), ..Default::default() };

        let line = wall_surface_takeoff(&wall(SurfaceType::Both), &ft, &wall_assignment(overrides), &[]).unwrap();
        // 10 × 1.5 × 1 × 1.05 = 15.75
        assert_eq!(line.quantity, 15.75);
        assert_eq!(
            line.formula_text,
            "Wall surface area = L × H × S × (1 + waste) = 10 × 1.5 × 1 × (1 + 0.05) = 15.750 m²"
        );
    }

    #[test]
    fn test_wall_surface_invalid_sides_override() {
        let ft = finish(FinishCategory::Wall, 0.0, None);
        let overrides = AssignmentOverrides { sides_count: Some(3), ..Default::default() };
        let result = wall_surface_takeoff(&wall(SurfaceType::Exterior), &ft, &wall_assignment(overrides), &[]);
        assert!(matches!(result, Err(CalcError::InvalidInput { .. })));
    }

    #[test]
    fn test_waste_monotonic() {
        let mut previous = 0.0;
        for waste in [0.0, 0.02, 0.05, 0.1, 0.25] {
            let overrides = AssignmentOverrides { waste_percent: Some(waste), ..Default::default() };
            let line = wall_surface_takeoff(&wall(SurfaceType::Exterior), &finish(FinishCategory::Paint, 0.0, None), &wall_assignment(overrides), &[]).unwrap();
            assert!(line.quantity >= previous);
            previous = line.quantity;
        }
    }

    #[test]
    fn test_repeat_runs_are_identical_except_id() {
        let mut ft = finish(FinishCategory::Paint, 0.05, None);
        ft.deduction_rule = Some(deduct_all(0.5));
        let openings = vec![opening("D1", "door", 1.89)];
        let a = wall_takeoff(&space(), &ft, &space_assignment(Default::default()), 3.0, &openings).unwrap();
        let b = wall_takeoff(&space(), &ft, &space_assignment(Default::default()), 3.0, &openings).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.quantity.to_bits(), b.quantity.to_bits());
        assert_eq!(a.formula_text, b.formula_text);
        assert_eq!(a.assumptions, b.assumptions);
        assert_eq!(a.inputs_snapshot, b.inputs_snapshot);
    }
}
