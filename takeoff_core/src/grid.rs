//! # Coordinate / Grid Resolver
//!
//! Resolves named grid lines and levels to numeric offsets and elevations.
//! Every geometry calculator goes through this module; a label that does not
//! resolve is an error, never a silent zero.
//!
//! The raw arrays are immutable for the duration of a calc run, so
//! [`GridIndex`] and [`LevelIndex`] build their `label -> index` maps once and
//! borrow the arrays instead of re-scanning them on every lookup.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::grid::{Axis, GridLine, GridSystem, GridIndex};
//!
//! let grid = GridSystem {
//!     grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0)],
//!     grid_y: vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0)],
//! };
//! let index = GridIndex::new(&grid);
//!
//! assert_eq!(index.offset(Axis::X, "B").unwrap(), 5.0);
//! assert!(index.offset(Axis::Y, "9").is_err());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::trace::{TraceEvent, TraceSink, NOOP_TRACE};

/// A named coordinate on one axis (meters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub label: String,
    pub offset: f64,
}

impl GridLine {
    pub fn new(label: impl Into<String>, offset: f64) -> Self {
        GridLine {
            label: label.into(),
            offset,
        }
    }
}

/// A named vertical datum (meters).
///
/// Spaces and element instances refer to levels by `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub label: String,
    pub elevation: f64,
}

impl Level {
    pub fn new(label: impl Into<String>, elevation: f64) -> Self {
        Level {
            label: label.into(),
            elevation,
        }
    }
}

/// Plan grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The perpendicular axis. A wall sitting on an X grid line spans along Y.
    pub fn cross(&self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The project's plan grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridSystem {
    pub grid_x: Vec<GridLine>,
    pub grid_y: Vec<GridLine>,
}

impl GridSystem {
    pub fn lines(&self, axis: Axis) -> &[GridLine] {
        match axis {
            Axis::X => &self.grid_x,
            Axis::Y => &self.grid_y,
        }
    }
}

/// Resolve one label against a single axis array without building an index.
///
/// Fails with `GridLineNotFound` listing every available label.
pub fn resolve_grid_line(lines: &[GridLine], axis: Axis, label: &str) -> CalcResult<f64> {
    lines
        .iter()
        .find(|line| line.label == label)
        .map(|line| line.offset)
        .ok_or_else(|| {
            CalcError::grid_line_not_found(
                axis.name(),
                label,
                lines.iter().map(|line| line.label.clone()).collect(),
            )
        })
}

/// Resolve one level label against the level array without building an index.
pub fn resolve_level(levels: &[Level], label: &str) -> CalcResult<f64> {
    levels
        .iter()
        .find(|level| level.label == label)
        .map(|level| level.elevation)
        .ok_or_else(|| {
            CalcError::level_not_found(label, levels.iter().map(|level| level.label.clone()).collect())
        })
}

fn build_map<'a, T>(items: &'a [T], label: impl Fn(&'a T) -> &'a str) -> HashMap<&'a str, usize> {
    let mut map = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        // first definition wins if a label is duplicated
        map.entry(label(item)).or_insert(i);
    }
    map
}

/// Label -> offset index over a [`GridSystem`], built once per calc run.
pub struct GridIndex<'a> {
    grid: &'a GridSystem,
    x: HashMap<&'a str, usize>,
    y: HashMap<&'a str, usize>,
    trace: &'a dyn TraceSink,
}

impl<'a> GridIndex<'a> {
    pub fn new(grid: &'a GridSystem) -> Self {
        GridIndex {
            grid,
            x: build_map(&grid.grid_x, |line| line.label.as_str()),
            y: build_map(&grid.grid_y, |line| line.label.as_str()),
            trace: &NOOP_TRACE,
        }
    }

    /// Report every resolved lookup to `trace`
    pub fn with_trace(mut self, trace: &'a dyn TraceSink) -> Self {
        self.trace = trace;
        self
    }

    fn map(&self, axis: Axis) -> &HashMap<&'a str, usize> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// True if `label` exists on `axis`
    pub fn contains(&self, axis: Axis, label: &str) -> bool {
        self.map(axis).contains_key(label)
    }

    /// All labels on `axis`, in declaration order
    pub fn labels(&self, axis: Axis) -> Vec<String> {
        self.grid.lines(axis).iter().map(|line| line.label.clone()).collect()
    }

    /// Resolve `label` on `axis` to its offset.
    pub fn offset(&self, axis: Axis, label: &str) -> CalcResult<f64> {
        let i = self
            .map(axis)
            .get(label)
            .copied()
            .ok_or_else(|| CalcError::grid_line_not_found(axis.name(), label, self.labels(axis)))?;
        let offset = self.grid.lines(axis)[i].offset;
        self.trace.record(&TraceEvent::GridResolved {
            axis: axis.name().to_string(),
            label: label.to_string(),
            offset,
        });
        Ok(offset)
    }

    pub fn offset_x(&self, label: &str) -> CalcResult<f64> {
        self.offset(Axis::X, label)
    }

    pub fn offset_y(&self, label: &str) -> CalcResult<f64> {
        self.offset(Axis::Y, label)
    }

    /// Resolve two labels on the same axis and return `|end - start|`.
    ///
    /// When both labels are missing, the error names both.
    pub fn distance(&self, axis: Axis, start: &str, end: &str) -> CalcResult<f64> {
        let missing: Vec<String> = [start, end]
            .iter()
            .filter(|label| !self.contains(axis, label))
            .map(|label| label.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CalcError::GridLineNotFound {
                axis: axis.name().to_string(),
                labels: missing,
                available: self.labels(axis),
            });
        }
        Ok((self.offset(axis, end)? - self.offset(axis, start)?).abs())
    }
}

/// Label -> elevation index over the project's levels.
pub struct LevelIndex<'a> {
    levels: &'a [Level],
    map: HashMap<&'a str, usize>,
    trace: &'a dyn TraceSink,
}

impl<'a> LevelIndex<'a> {
    pub fn new(levels: &'a [Level]) -> Self {
        LevelIndex {
            levels,
            map: build_map(levels, |level| level.label.as_str()),
            trace: &NOOP_TRACE,
        }
    }

    pub fn with_trace(mut self, trace: &'a dyn TraceSink) -> Self {
        self.trace = trace;
        self
    }

    pub fn contains(&self, label: &str) -> bool {
        self.map.contains_key(label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.levels.iter().map(|level| level.label.clone()).collect()
    }

    /// Resolve `label` to its elevation.
    pub fn elevation(&self, label: &str) -> CalcResult<f64> {
        let i = self
            .map
            .get(label)
            .copied()
            .ok_or_else(|| CalcError::level_not_found(label, self.labels()))?;
        let elevation = self.levels[i].elevation;
        self.trace.record(&TraceEvent::LevelResolved {
            label: label.to_string(),
            elevation,
        });
        Ok(elevation)
    }

    /// Absolute elevation difference between two levels.
    pub fn height_between(&self, start: &str, end: &str) -> CalcResult<f64> {
        Ok((self.elevation(end)? - self.elevation(start)?).abs())
    }

    /// The next level strictly above `label`, if any.
    pub fn level_above(&self, label: &str) -> CalcResult<Option<&'a Level>> {
        let base = self.elevation(label)?;
        Ok(self
            .levels
            .iter()
            .filter(|level| level.elevation > base)
            .min_by(|a, b| a.elevation.total_cmp(&b.elevation)))
    }

    /// Storey height above `label`, or `None` for the topmost level.
    pub fn storey_height(&self, label: &str) -> CalcResult<Option<f64>> {
        let base = self.elevation(label)?;
        Ok(self.level_above(label)?.map(|above| above.elevation - base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::CollectingTrace;

    fn test_grid() -> GridSystem {
        GridSystem {
            grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0), GridLine::new("C", 10.0)],
            grid_y: vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0), GridLine::new("3", 12.0)],
        }
    }

    fn test_levels() -> Vec<Level> {
        vec![Level::new("L2", 3.2), Level::new("L1", 0.0), Level::new("Roof", 6.0)]
    }

    #[test]
    fn test_offset_lookup() {
        let grid = test_grid();
        let index = GridIndex::new(&grid);
        assert_eq!(index.offset_x("C").unwrap(), 10.0);
        assert_eq!(index.offset_y("2").unwrap(), 6.0);
    }

    #[test]
    fn test_missing_label_lists_available() {
        let grid = test_grid();
        let index = GridIndex::new(&grid);
        match index.offset(Axis::X, "Z") {
            Err(CalcError::GridLineNotFound { axis, labels, available }) => {
                assert_eq!(axis, "X");
                assert_eq!(labels, vec!["Z".to_string()]);
                assert_eq!(available, vec!["A", "B", "C"]);
            }
            other => panic!("expected GridLineNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_distance_reports_both_missing_labels() {
        let grid = test_grid();
        let index = GridIndex::new(&grid);
        match index.distance(Axis::Y, "8", "9") {
            Err(CalcError::GridLineNotFound { labels, .. }) => {
                assert_eq!(labels, vec!["8".to_string(), "9".to_string()]);
            }
            other => panic!("expected GridLineNotFound, got {:?}", other),
        }
        assert_eq!(index.distance(Axis::Y, "3", "1").unwrap(), 12.0);
    }

    #[test]
    fn test_free_function_resolvers() {
        let grid = test_grid();
        assert_eq!(resolve_grid_line(&grid.grid_x, Axis::X, "B").unwrap(), 5.0);
        assert!(resolve_grid_line(&grid.grid_y, Axis::Y, "B").is_err());
        assert_eq!(resolve_level(&test_levels(), "Roof").unwrap(), 6.0);
        assert!(matches!(
            resolve_level(&test_levels(), "L9"),
            Err(CalcError::LevelNotFound { .. })
        ));
    }

    #[test]
    fn test_level_index() {
        let levels = test_levels();
        let index = LevelIndex::new(&levels);
        assert!((index.height_between("L2", "L1").unwrap() - 3.2).abs() < 1e-9);
        assert_eq!(index.level_above("L1").unwrap().map(|l| l.label.as_str()), Some("L2"));
        assert!(index.level_above("Roof").unwrap().is_none());
        assert!((index.storey_height("L2").unwrap().unwrap() - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_trace_receives_lookups() {
        let grid = test_grid();
        let trace = CollectingTrace::new();
        let index = GridIndex::new(&grid).with_trace(&trace);
        index.offset_x("A").unwrap();
        index.offset_y("3").unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(
            trace.events()[1],
            TraceEvent::GridResolved { axis: "Y".into(), label: "3".into(), offset: 12.0 }
        );
    }

    #[test]
    fn test_axis_cross() {
        assert_eq!(Axis::X.cross(), Axis::Y);
        assert_eq!(Axis::Y.cross(), Axis::X);
    }
}
