//! # Space Geometry
//!
//! Area and perimeter of a 2D space bounded either by a grid rectangle (two
//! grid labels per axis) or by a free-form polygon.
//!
//! ```text
//!   Y3 ┌───────────────┐
//!      │               │      width  = |x_end - x_start|
//!   Y2 ├───────┐       │      length = |y_end - y_start|
//!      │ space │       │      area   = width × length
//!   Y1 └───────┴───────┘      perim  = 2 × (width + length)
//!      XA      XB      XC
//! ```
//!
//! Polygons use the shoelace formula over the implicitly closed ring; the
//! absolute value makes the result independent of winding direction.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{CalcError, CalcResult};
use crate::grid::{Axis, GridIndex};
use crate::units::round_to;

/// Decimal places for derived space geometry
const GEOMETRY_DECIMALS: u32 = 3;

/// A plan point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

/// Rectangle bounded by two grid lines on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRectBoundary {
    /// `[start, end]` labels on the X axis
    pub grid_x: [String; 2],
    /// `[start, end]` labels on the Y axis
    pub grid_y: [String; 2],
}

impl GridRectBoundary {
    pub fn new(x: [&str; 2], y: [&str; 2]) -> Self {
        GridRectBoundary {
            grid_x: [x[0].to_string(), x[1].to_string()],
            grid_y: [y[0].to_string(), y[1].to_string()],
        }
    }
}

/// Free-form boundary; the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonBoundary {
    pub points: Vec<Point>,
}

impl PolygonBoundary {
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        PolygonBoundary {
            points: points.into_iter().map(Point::from).collect(),
        }
    }
}

/// Space boundary, tagged by `"type"`.
///
/// ## JSON
///
/// ```json
/// { "type": "gridRect", "grid_x": ["A", "B"], "grid_y": ["1", "2"] }
/// { "type": "polygon", "points": [{ "x": 0, "y": 0 }, { "x": 4, "y": 0 }, { "x": 4, "y": 5 }] }
/// ```
///
/// Any other tag deserializes into [`SpaceBoundary::Unknown`] so the
/// calculation, not the loader, reports `UnknownBoundaryType`.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceBoundary {
    GridRect(GridRectBoundary),
    Polygon(PolygonBoundary),
    Unknown { tag: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum TaggedBoundary<'a> {
    GridRect(&'a GridRectBoundary),
    Polygon(&'a PolygonBoundary),
}

impl Serialize for SpaceBoundary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SpaceBoundary::GridRect(b) => TaggedBoundary::GridRect(b).serialize(serializer),
            SpaceBoundary::Polygon(b) => TaggedBoundary::Polygon(b).serialize(serializer),
            SpaceBoundary::Unknown { tag } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", tag)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SpaceBoundary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();
        match tag.as_str() {
            "gridRect" => serde_json::from_value(value)
                .map(SpaceBoundary::GridRect)
                .map_err(D::Error::custom),
            "polygon" => serde_json::from_value(value)
                .map(SpaceBoundary::Polygon)
                .map_err(D::Error::custom),
            _ => Ok(SpaceBoundary::Unknown { tag }),
        }
    }
}

/// Derived area/perimeter of a space. Never hand-edited.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpaceGeometry {
    pub area_m2: f64,
    pub perimeter_m: f64,
}

/// A room or zone on one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    /// Label of the level the space sits on
    pub level_id: String,
    pub boundary: SpaceBoundary,
    #[serde(default)]
    pub computed: SpaceGeometry,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Double-height void: no ceiling finish is taken off
    #[serde(default)]
    pub open_to_below: bool,
}

impl Space {
    /// Recompute `computed` from the boundary.
    pub fn recompute(&mut self, grid: &GridIndex) -> CalcResult<()> {
        self.computed = compute_space_geometry(self, grid)?;
        Ok(())
    }
}

/// Area and perimeter of a grid-rectangle boundary.
///
/// # Example
///
/// ```rust
/// use takeoff_core::geometry::{compute_grid_rect_geometry, GridRectBoundary};
/// use takeoff_core::grid::{GridIndex, GridLine, GridSystem};
///
/// let grid = GridSystem {
///     grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0)],
///     grid_y: vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0)],
/// };
/// let geom = compute_grid_rect_geometry(
///     &GridRectBoundary::new(["A", "B"], ["1", "2"]),
///     &GridIndex::new(&grid),
/// ).unwrap();
/// assert_eq!(geom.area_m2, 30.0);
/// assert_eq!(geom.perimeter_m, 22.0);
/// ```
pub fn compute_grid_rect_geometry(boundary: &GridRectBoundary, grid: &GridIndex) -> CalcResult<SpaceGeometry> {
    let width = grid.distance(Axis::X, &boundary.grid_x[0], &boundary.grid_x[1])?;
    let length = grid.distance(Axis::Y, &boundary.grid_y[0], &boundary.grid_y[1])?;

    Ok(SpaceGeometry {
        area_m2: round_to(width * length, GEOMETRY_DECIMALS),
        perimeter_m: round_to(2.0 * (width + length), GEOMETRY_DECIMALS),
    })
}

/// Shoelace area over the closed ring (unrounded).
pub fn shoelace_area(points: &[Point]) -> f64 {
    let n = points.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum();
    twice_area.abs() / 2.0
}

/// Sum of edge lengths over the closed ring (unrounded).
pub fn ring_perimeter(points: &[Point]) -> f64 {
    let n = points.len();
    (0..n).map(|i| points[i].distance_to(&points[(i + 1) % n])).sum()
}

/// Area and perimeter of a polygon boundary.
///
/// Fails with `InvalidPolygon` for fewer than three points and with
/// `InvalidDimension` for a non-finite coordinate.
pub fn compute_polygon_geometry(boundary: &PolygonBoundary) -> CalcResult<SpaceGeometry> {
    if boundary.points.len() < 3 {
        return Err(CalcError::InvalidPolygon {
            point_count: boundary.points.len(),
        });
    }
    for (i, point) in boundary.points.iter().enumerate() {
        for (axis, value) in [("x", point.x), ("y", point.y)] {
            if !value.is_finite() {
                return Err(CalcError::invalid_dimension(
                    format!("points[{}].{}", i, axis),
                    value,
                    "Polygon coordinates must be finite",
                ));
            }
        }
    }

    Ok(SpaceGeometry {
        area_m2: round_to(shoelace_area(&boundary.points), GEOMETRY_DECIMALS),
        perimeter_m: round_to(ring_perimeter(&boundary.points), GEOMETRY_DECIMALS),
    })
}

/// Dispatch on the boundary variant.
pub fn compute_boundary_geometry(boundary: &SpaceBoundary, grid: &GridIndex) -> CalcResult<SpaceGeometry> {
    match boundary {
        SpaceBoundary::GridRect(rect) => compute_grid_rect_geometry(rect, grid),
        SpaceBoundary::Polygon(polygon) => compute_polygon_geometry(polygon),
        SpaceBoundary::Unknown { tag } => Err(CalcError::UnknownBoundaryType { tag: tag.clone() }),
    }
}

/// Geometry of a space from its boundary.
pub fn compute_space_geometry(space: &Space, grid: &GridIndex) -> CalcResult<SpaceGeometry> {
    compute_boundary_geometry(&space.boundary, grid)
}
