//! # Wall Surface Geometry
//!
//! An explicitly modeled vertical plane sitting on one grid line, spanning
//! between two grid lines of the *cross* axis, from one level to another.
//!
//! ```text
//!            span[0]            span[1]        (cross-axis grid lines)
//!   levelEnd   ┌──────────────────┐
//!              │                  │  height = |elev(end) - elev(start)|
//!   levelStart └──────────────────┘
//!                  length = |offset(span[1]) - offset(span[0])|
//! ```
//!
//! `sides_count` comes from the surface type alone: an exterior face is
//! finished on one side, interior partitions on both.

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::grid::{Axis, GridIndex, LevelIndex};
use crate::units::round_to;

const GEOMETRY_DECIMALS: u32 = 3;

/// Which face(s) of the wall carry finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceType {
    Exterior,
    Interior,
    Both,
}

impl SurfaceType {
    /// exterior -> 1, interior -> 2, both -> 2
    pub fn sides_count(&self) -> u8 {
        match self {
            SurfaceType::Exterior => 1,
            SurfaceType::Interior | SurfaceType::Both => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SurfaceType::Exterior => "exterior",
            SurfaceType::Interior => "interior",
            SurfaceType::Both => "both",
        }
    }
}

/// The grid line a wall sits on and the cross-axis labels bounding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallGridLine {
    pub axis: Axis,
    pub label: String,
    pub span: [String; 2],
}

impl WallGridLine {
    pub fn new(axis: Axis, label: impl Into<String>, span: [&str; 2]) -> Self {
        WallGridLine {
            axis,
            label: label.into(),
            span: [span[0].to_string(), span[1].to_string()],
        }
    }
}

/// Derived wall geometry. Never hand-edited.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WallSurfaceGeometry {
    pub length_m: f64,
    pub height_m: f64,
    pub gross_area_m2: f64,
    pub sides_count: u8,
    pub total_area_m2: f64,
}

/// A modeled wall plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSurface {
    pub id: String,
    pub name: String,
    pub grid_line: WallGridLine,
    pub level_start: String,
    pub level_end: String,
    pub surface_type: SurfaceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<String>,
    #[serde(default)]
    pub computed: WallSurfaceGeometry,
}

impl WallSurface {
    pub fn recompute(&mut self, grid: &GridIndex, levels: &LevelIndex) -> CalcResult<()> {
        self.computed = compute_wall_surface_geometry(self, grid, levels)?;
        Ok(())
    }
}

/// Length of the wall measured on the cross axis.
///
/// The wall's own line must exist as well as both span labels.
pub fn compute_grid_span_length(grid_line: &WallGridLine, grid: &GridIndex) -> CalcResult<f64> {
    grid.offset(grid_line.axis, &grid_line.label)?;
    grid.distance(grid_line.axis.cross(), &grid_line.span[0], &grid_line.span[1])
}

/// Absolute elevation difference between two named levels.
pub fn compute_level_height(level_start: &str, level_end: &str, levels: &LevelIndex) -> CalcResult<f64> {
    levels.height_between(level_start, level_end)
}

/// Length, height, gross and total area of a wall surface, rounded to 3 decimals.
///
/// # Example
///
/// ```rust
/// use takeoff_core::geometry::{compute_wall_surface_geometry, SurfaceType, WallGridLine, WallSurface};
/// use takeoff_core::grid::{Axis, GridIndex, GridLine, GridSystem, Level, LevelIndex};
///
/// let grid = GridSystem {
///     grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0)],
///     grid_y: vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0)],
/// };
/// let levels = vec![Level::new("L1", 0.0), Level::new("L2", 3.0)];
/// let wall = WallSurface {
///     id: "W1".into(),
///     name: "Grid A".into(),
///     grid_line: WallGridLine::new(Axis::X, "A", ["1", "2"]),
///     level_start: "L1".into(),
///     level_end: "L2".into(),
///     surface_type: SurfaceType::Interior,
///     facing: None,
///     computed: Default::default(),
/// };
/// let geom = compute_wall_surface_geometry(&wall, &GridIndex::new(&grid), &LevelIndex::new(&levels)).unwrap();
/// assert_eq!(geom.gross_area_m2, 18.0);
/// assert_eq!(geom.total_area_m2, 36.0);
/// ```
pub fn compute_wall_surface_geometry(
    wall: &WallSurface,
    grid: &GridIndex,
    levels: &LevelIndex,
) -> CalcResult<WallSurfaceGeometry> {
    let length = compute_grid_span_length(&wall.grid_line, grid)?;
    let height = compute_level_height(&wall.level_start, &wall.level_end, levels)?;
    let gross = length * height;
    let sides = wall.surface_type.sides_count();

    Ok(WallSurfaceGeometry {
        length_m: round_to(length, GEOMETRY_DECIMALS),
        height_m: round_to(height, GEOMETRY_DECIMALS),
        gross_area_m2: round_to(gross, GEOMETRY_DECIMALS),
        sides_count: sides,
        total_area_m2: round_to(gross * f64::from(sides), GEOMETRY_DECIMALS),
    })
}

/// A wall surface as typed into an editor, before it is committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallSurfaceDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub grid_line: Option<WallGridLine>,
    #[serde(default)]
    pub level_start: Option<String>,
    #[serde(default)]
    pub level_end: Option<String>,
    #[serde(default)]
    pub surface_type: Option<SurfaceType>,
}

impl From<&WallSurface> for WallSurfaceDraft {
    fn from(wall: &WallSurface) -> Self {
        WallSurfaceDraft {
            name: Some(wall.name.clone()),
            grid_line: Some(wall.grid_line.clone()),
            level_start: Some(wall.level_start.clone()),
            level_end: Some(wall.level_end.clone()),
            surface_type: Some(wall.surface_type),
        }
    }
}

/// Outcome of a pre-commit validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        ValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Collect every problem with a draft wall surface without failing fast.
pub fn validate_wall_surface(draft: &WallSurfaceDraft, grid: &GridIndex, levels: &LevelIndex) -> ValidationResult {
    let mut errors = Vec::new();

    if present(&draft.name).is_none() {
        errors.push("Name is required".to_string());
    }

    match &draft.grid_line {
        None => errors.push("Grid line is required".to_string()),
        Some(line) => {
            if line.label.trim().is_empty() {
                errors.push("Grid line label is required".to_string());
            } else if !grid.contains(line.axis, &line.label) {
                errors.push(format!(
                    "Grid line '{}' not found on {} axis (available: {})",
                    line.label,
                    line.axis,
                    grid.labels(line.axis).join(", ")
                ));
            }

            let cross = line.axis.cross();
            for (position, label) in ["start", "end"].iter().zip(line.span.iter()) {
                if label.trim().is_empty() {
                    errors.push(format!("Span {} is required", position));
                } else if !grid.contains(cross, label) {
                    errors.push(format!(
                        "Span {} '{}' not found on {} axis (available: {})",
                        position,
                        label,
                        cross,
                        grid.labels(cross).join(", ")
                    ));
                }
            }
        }
    }

    for (field, value) in [("Level start", &draft.level_start), ("Level end", &draft.level_end)] {
        match present(value) {
            None => errors.push(format!("{} is required", field)),
            Some(label) if !levels.contains(label) => {
                errors.push(format!("{} '{}' not found", field, label));
            }
            Some(_) => {}
        }
    }

    if draft.surface_type.is_none() {
        errors.push("Surface type is required".to_string());
    }

    ValidationResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalcError;
    use crate::grid::{GridLine, GridSystem, Level};

    fn test_grid() -> GridSystem {
        GridSystem {
            grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0), GridLine::new("C", 10.0)],
            grid_y: vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0), GridLine::new("3", 12.0)],
        }
    }

    fn test_levels() -> Vec<Level> {
        vec![Level::new("L1", 0.0), Level::new("L2", 3.0), Level::new("L3", 6.5)]
    }

    fn wall(axis: Axis, label: &str, span: [&str; 2], surface_type: SurfaceType) -> WallSurface {
        WallSurface {
            id: "W1".into(),
            name: "Test Wall".into(),
            grid_line: WallGridLine::new(axis, label, span),
            level_start: "L1".into(),
            level_end: "L2".into(),
            surface_type,
            facing: None,
            computed: WallSurfaceGeometry::default(),
        }
    }

    #[test]
    fn test_sides_count() {
        assert_eq!(SurfaceType::Exterior.sides_count(), 1);
        assert_eq!(SurfaceType::Interior.sides_count(), 2);
        assert_eq!(SurfaceType::Both.sides_count(), 2);
    }

    #[test]
    fn test_span_measured_on_cross_axis() {
        let grid = test_grid();
        let index = GridIndex::new(&grid);
        // wall on X grid "B" spanning Y 1..3
        let on_x = WallGridLine::new(Axis::X, "B", ["1", "3"]);
        assert_eq!(compute_grid_span_length(&on_x, &index).unwrap(), 12.0);
        // wall on Y grid "2" spanning X A..B
        let on_y = WallGridLine::new(Axis::Y, "2", ["A", "B"]);
        assert_eq!(compute_grid_span_length(&on_y, &index).unwrap(), 5.0);
    }

    #[test]
    fn test_span_with_labels_from_wrong_axis_fails() {
        let grid = test_grid();
        let line = WallGridLine::new(Axis::X, "A", ["A", "C"]);
        assert!(matches!(
            compute_grid_span_length(&line, &GridIndex::new(&grid)),
            Err(CalcError::GridLineNotFound { .. })
        ));
    }

    #[test]
    fn test_wall_geometry_exterior() {
        let grid = test_grid();
        let levels = test_levels();
        let w = wall(Axis::Y, "1", ["A", "C"], SurfaceType::Exterior);
        let geom = compute_wall_surface_geometry(&w, &GridIndex::new(&grid), &LevelIndex::new(&levels)).unwrap();
        assert_eq!(geom.length_m, 10.0);
        assert_eq!(geom.height_m, 3.0);
        assert_eq!(geom.gross_area_m2, 30.0);
        assert_eq!(geom.sides_count, 1);
        assert_eq!(geom.total_area_m2, 30.0);
    }

    #[test]
    fn test_wall_geometry_missing_level() {
        let grid = test_grid();
        let levels = test_levels();
        let mut w = wall(Axis::Y, "1", ["A", "C"], SurfaceType::Both);
        w.level_end = "L9".into();
        let result = compute_wall_surface_geometry(&w, &GridIndex::new(&grid), &LevelIndex::new(&levels));
        assert!(matches!(result, Err(CalcError::LevelNotFound { .. })));
    }

    #[test]
    fn test_validate_complete_wall() {
        let grid = test_grid();
        let levels = test_levels();
        let w = wall(Axis::X, "A", ["1", "2"], SurfaceType::Interior);
        let result = validate_wall_surface(&WallSurfaceDraft::from(&w), &GridIndex::new(&grid), &LevelIndex::new(&levels));
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let grid = test_grid();
        let levels = test_levels();
        let draft = WallSurfaceDraft {
            name: Some("  ".into()),
            grid_line: Some(WallGridLine::new(Axis::X, "Q", ["1", "9"])),
            level_start: Some("L1".into()),
            level_end: Some("L7".into()),
            surface_type: None,
        };
        let result = validate_wall_surface(&draft, &GridIndex::new(&grid), &LevelIndex::new(&levels));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 5);
        assert_eq!(result.errors[0], "Name is required");
        assert!(result.errors[1].starts_with("Grid line 'Q' not found on X axis"));
        assert!(result.errors[2].starts_with("Span end '9' not found on Y axis"));
        assert_eq!(result.errors[3], "Level end 'L7' not found");
        assert_eq!(result.errors[4], "Surface type is required");
    }

    #[test]
    fn test_validate_empty_draft() {
        let grid = test_grid();
        let levels = test_levels();
        let result = validate_wall_surface(&WallSurfaceDraft::default(), &GridIndex::new(&grid), &LevelIndex::new(&levels));
        assert_eq!(
            result.errors,
            vec![
                "Name is required",
                "Grid line is required",
                "Level start is required",
                "Level end is required",
                "Surface type is required",
            ]
        );
    }
}
