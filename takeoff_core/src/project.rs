//! # Project Snapshot
//!
//! The `ProjectSnapshot` is the root input of a calc run: the grid, levels,
//! modeled spaces and walls, finish types and their assignments, structural
//! templates and instances, and earthwork items. Snapshots serialize to
//! human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! ProjectSnapshot
//! ├── meta: ProjectMetadata (schema version, project name/code, timestamps)
//! ├── settings: CalcSettings (rounding, storey height, rebar grade threshold)
//! ├── grid, levels
//! ├── spaces, wall_surfaces, openings
//! ├── finish_types, space_finish_assignments, wall_surface_finish_assignments
//! ├── element_templates, element_instances
//! └── excavation_items
//! ```
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::project::ProjectSnapshot;
//!
//! let snapshot = ProjectSnapshot::new("Two-storey residence", "24-017");
//! let json = serde_json::to_string_pretty(&snapshot).unwrap();
//! let back: ProjectSnapshot = serde_json::from_str(&json).unwrap();
//! assert_eq!(back.meta.project_code, "24-017");
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::elements::{ElementInstance, ElementTemplate};
use crate::errors::{CalcError, CalcResult};
use crate::excavation::ExcavationItem;
use crate::finishes::{validate_waste, FinishType, SpaceFinishAssignment, WallSurfaceFinishAssignment};
use crate::geometry::{Opening, Space, WallSurface};
use crate::grid::{GridSystem, Level};
use crate::units::{validate_rounding, DEFAULT_ROUNDING};

/// Current schema version for snapshot files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root input of a calc run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: CalcSettings,

    #[serde(default)]
    pub grid: GridSystem,

    #[serde(default)]
    pub levels: Vec<Level>,

    #[serde(default)]
    pub spaces: Vec<Space>,

    #[serde(default)]
    pub wall_surfaces: Vec<WallSurface>,

    #[serde(default)]
    pub openings: Vec<Opening>,

    #[serde(default)]
    pub finish_types: Vec<FinishType>,

    #[serde(default)]
    pub space_finish_assignments: Vec<SpaceFinishAssignment>,

    #[serde(default)]
    pub wall_surface_finish_assignments: Vec<WallSurfaceFinishAssignment>,

    #[serde(default)]
    pub element_templates: Vec<ElementTemplate>,

    #[serde(default)]
    pub element_instances: Vec<ElementInstance>,

    #[serde(default)]
    pub excavation_items: Vec<ExcavationItem>,
}

impl ProjectSnapshot {
    /// Create an empty snapshot stamped with the current schema version.
    pub fn new(project_name: impl Into<String>, project_code: impl Into<String>) -> Self {
        let now = Utc::now();
        ProjectSnapshot {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                project_name: project_name.into(),
                project_code: project_code.into(),
                created: now,
                modified: now,
            },
            settings: CalcSettings::default(),
            grid: GridSystem::default(),
            levels: Vec::new(),
            spaces: Vec::new(),
            wall_surfaces: Vec::new(),
            openings: Vec::new(),
            finish_types: Vec::new(),
            space_finish_assignments: Vec::new(),
            wall_surface_finish_assignments: Vec::new(),
            element_templates: Vec::new(),
            element_instances: Vec::new(),
            excavation_items: Vec::new(),
        }
    }

    /// Number of modeled items of every kind
    pub fn item_count(&self) -> usize {
        self.spaces.len()
            + self.wall_surfaces.len()
            + self.openings.len()
            + self.element_instances.len()
            + self.excavation_items.len()
    }
}

/// Id lookup over a borrowed slice. The first entry wins on duplicate ids.
pub(crate) fn index_by_id<'a, T>(items: &'a [T], id: impl Fn(&T) -> &str) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(id(item)).or_insert(item);
    }
    map
}

/// Snapshot header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    #[serde(default)]
    pub project_name: String,

    /// Contract / job number
    #[serde(default)]
    pub project_code: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Calculation defaults applied across a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcSettings {
    /// Decimal places of structural element quantities
    pub default_rounding: u32,

    /// Storey height used for perimeter wall finishes when no level sits above the space
    pub default_storey_height_m: f64,

    /// Bars at least this size select the Grade 60 pay item
    pub rebar_grade60_min_diameter_mm: f64,

    /// Fractional waste on concrete volumes
    pub concrete_waste_percent: f64,
}

impl CalcSettings {
    /// Reject settings no quantity can be derived from.
    pub fn validate(&self) -> CalcResult<()> {
        validate_rounding("settings.default_rounding", self.default_rounding)?;
        validate_waste("settings.concrete_waste_percent", self.concrete_waste_percent)?;
        if !(self.default_storey_height_m > 0.0) || !self.default_storey_height_m.is_finite() {
            return Err(CalcError::invalid_dimension(
                "settings.default_storey_height_m",
                self.default_storey_height_m,
                "Storey height must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for CalcSettings {
    fn default() -> Self {
        CalcSettings {
            default_rounding: DEFAULT_ROUNDING,
            default_storey_height_m: 3.0,
            rebar_grade60_min_diameter_mm: 16.0,
            concrete_waste_percent: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_creation() {
        let snapshot = ProjectSnapshot::new("Residence", "24-017");
        assert_eq!(snapshot.meta.version, SCHEMA_VERSION);
        assert_eq!(snapshot.meta.project_name, "Residence");
        assert_eq!(snapshot.item_count(), 0);
    }

    #[test]
    fn test_minimal_snapshot_json() {
        let json = r#"{
            "meta": {
                "version": "0.1.0",
                "created": "2024-05-01T08:00:00Z",
                "modified": "2024-05-01T08:00:00Z"
            }
        }"#;
        let snapshot: ProjectSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.settings, CalcSettings::default());
        assert!(snapshot.levels.is_empty());
        assert!(snapshot.grid.grid_x.is_empty());
    }

    #[test]
    fn test_partial_settings() {
        let settings: CalcSettings = serde_json::from_str(r#"{"default_storey_height_m": 2.8}"#).unwrap();
        assert_eq!(settings.default_storey_height_m, 2.8);
        assert_eq!(settings.default_rounding, 3);
        assert_eq!(settings.rebar_grade60_min_diameter_mm, 16.0);
    }

    #[test]
    fn test_settings_validation() {
        assert!(CalcSettings::default().validate().is_ok());

        let settings = CalcSettings { default_rounding: 400, ..Default::default() };
        assert!(matches!(settings.validate(), Err(CalcError::InvalidInput { .. })));

        let settings = CalcSettings { concrete_waste_percent: 2.0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(CalcError::InvalidDimension { .. })));

        let settings = CalcSettings { default_storey_height_m: 0.0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(CalcError::InvalidDimension { .. })));
    }

    #[test]
    fn test_index_by_id_first_wins() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let index = index_by_id(&items, |item| item.0);
        assert_eq!(index["a"].1, 1);
        assert_eq!(index.len(), 2);
    }
}
