//! # Calc Run
//!
//! One synchronous pass over an immutable [`ProjectSnapshot`]:
//!
//! ```text
//! snapshot ─► label indices ─► recompute spaces / walls / openings
//!          ─► finish lines ─► structural element lines ─► earthwork lines
//!          ─► summary
//! ```
//!
//! The snapshot is never modified. Derived geometry is recomputed into
//! copies, so stale `computed` blocks in the input cannot leak into
//! quantities. Any failure aborts the run with the calculator's error; a run
//! either produces every line or none.
//!
//! Line ids and the run timestamp are the only non-deterministic outputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::PayItemCatalog;
use crate::classification::{aggregate, BoqReport, ReportView};
use crate::elements::element_takeoff;
use crate::errors::{CalcError, CalcResult};
use crate::excavation::{excavation_takeoff, sort_stations};
use crate::finishes::{ceiling_takeoff, floor_takeoff, wall_surface_takeoff, wall_takeoff, FinishCategory};
use crate::geometry::{Opening, Space, WallSurface};
use crate::grid::{GridIndex, LevelIndex};
use crate::project::{index_by_id, ProjectSnapshot};
use crate::takeoff::{Assumption, TakeoffLine, Trade};
use crate::trace::{TraceEvent, TraceSink};
use crate::units::{round_to, Unit};

/// Run header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub project_name: String,
    pub project_code: String,
    pub schema_version: String,
    pub engine_version: String,
    pub calculated_at: DateTime<Utc>,
}

/// Run-level totals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_concrete_m3: f64,
    pub total_rebar_kg: f64,
    pub total_formwork_m2: f64,
    pub total_excavation_m3: f64,
    /// Structural element instances taken off
    pub element_count: usize,
    pub line_count: usize,
    /// Finish quantity subtotal per category
    pub finish_area_by_category: BTreeMap<FinishCategory, f64>,
}

/// Output of one calc run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRun {
    pub meta: RunMetadata,
    pub lines: Vec<TakeoffLine>,
    pub summary: RunSummary,
    /// Catalog mismatches (unknown pay items, unit disagreements)
    pub warnings: Vec<String>,
}

impl CalcRun {
    /// Group this run's lines into a bill of quantities.
    pub fn report(&self, view: ReportView, catalog: &dyn PayItemCatalog) -> BoqReport {
        aggregate(&self.lines, view, catalog)
    }
}

fn record_line(trace: &dyn TraceSink, line: &TakeoffLine) {
    trace.record(&TraceEvent::QuantityComputed {
        source_id: line.source_element_id.clone(),
        resource_key: line.resource_key.clone(),
        quantity: line.quantity,
    });
    for assumption in &line.assumptions {
        if let Assumption::Deduction {
            count, total_area_m2, ..
        } = assumption
        {
            trace.record(&TraceEvent::OpeningsDeducted {
                target_id: line.source_element_id.clone(),
                count: *count,
                total_area_m2: *total_area_m2,
            });
        }
    }
}

/// Recompute derived geometry into copies of the snapshot's entities.
fn recompute_geometry(
    snapshot: &ProjectSnapshot,
    grid: &GridIndex,
    levels: &LevelIndex,
) -> CalcResult<(Vec<Space>, Vec<WallSurface>, Vec<Opening>)> {
    let mut spaces = snapshot.spaces.clone();
    for space in &mut spaces {
        levels.elevation(&space.level_id)?;
        space.recompute(grid)?;
    }

    let mut walls = snapshot.wall_surfaces.clone();
    for wall in &mut walls {
        wall.recompute(grid, levels)?;
    }

    let mut openings = snapshot.openings.clone();
    for opening in &mut openings {
        opening.recompute()?;
    }

    Ok((spaces, walls, openings))
}

/// Produce every takeoff line and the run summary for `snapshot`.
///
/// ```rust
/// use takeoff_core::catalog::InMemoryCatalog;
/// use takeoff_core::project::ProjectSnapshot;
/// use takeoff_core::run::run_calculation;
/// use takeoff_core::trace::NOOP_TRACE;
///
/// let snapshot = ProjectSnapshot::new("Empty", "00-000");
/// let run = run_calculation(&snapshot, &InMemoryCatalog::dpwh_defaults(), &NOOP_TRACE).unwrap();
/// assert_eq!(run.summary.line_count, 0);
/// ```
pub fn run_calculation(
    snapshot: &ProjectSnapshot,
    catalog: &dyn PayItemCatalog,
    trace: &dyn TraceSink,
) -> CalcResult<CalcRun> {
    let settings = &snapshot.settings;
    settings.validate()?;
    let grid = GridIndex::new(&snapshot.grid).with_trace(trace);
    let levels = LevelIndex::new(&snapshot.levels).with_trace(trace);

    let (spaces, walls, openings) = recompute_geometry(snapshot, &grid, &levels)?;

    let finish_types = index_by_id(&snapshot.finish_types, |f| f.id.as_str());
    let space_index = index_by_id(&spaces, |s| s.id.as_str());
    let wall_index = index_by_id(&walls, |w| w.id.as_str());
    let templates = index_by_id(&snapshot.element_templates, |t| t.id.as_str());

    let mut lines = Vec::new();
    let mut finish_area_by_category: BTreeMap<FinishCategory, f64> = BTreeMap::new();

    for assignment in &snapshot.space_finish_assignments {
        let space = space_index
            .get(assignment.space_id.as_str())
            .ok_or_else(|| CalcError::not_found("Space", &assignment.space_id))?;
        let finish = finish_types
            .get(assignment.finish_type_id.as_str())
            .ok_or_else(|| CalcError::not_found("Finish type", &assignment.finish_type_id))?;

        let line = match finish.category {
            FinishCategory::Floor => floor_takeoff(space, finish, assignment)?,
            FinishCategory::Ceiling => ceiling_takeoff(space, finish, assignment, space.open_to_below)?,
            FinishCategory::Wall | FinishCategory::Plaster | FinishCategory::Paint => {
                let storey = levels
                    .storey_height(&space.level_id)?
                    .unwrap_or(settings.default_storey_height_m);
                wall_takeoff(space, finish, assignment, storey, &openings)?
            }
        };
        *finish_area_by_category.entry(finish.category).or_default() += line.quantity;
        record_line(trace, &line);
        lines.push(line);
    }

    for assignment in &snapshot.wall_surface_finish_assignments {
        let wall = wall_index
            .get(assignment.wall_surface_id.as_str())
            .ok_or_else(|| CalcError::not_found("Wall surface", &assignment.wall_surface_id))?;
        let finish = finish_types
            .get(assignment.finish_type_id.as_str())
            .ok_or_else(|| CalcError::not_found("Finish type", &assignment.finish_type_id))?;
        if !finish.category.is_vertical() {
            return Err(CalcError::invalid_input(
                "finish_type_id",
                &finish.id,
                format!("A {} finish cannot be assigned to a wall surface", finish.category),
            ));
        }

        let line = wall_surface_takeoff(wall, finish, assignment, &openings)?;
        *finish_area_by_category.entry(finish.category).or_default() += line.quantity;
        record_line(trace, &line);
        lines.push(line);
    }

    for instance in &snapshot.element_instances {
        let template = templates
            .get(instance.template_id.as_str())
            .ok_or_else(|| CalcError::not_found("Element template", &instance.template_id))?;
        for line in element_takeoff(instance, template, &grid, &levels, settings)? {
            record_line(trace, &line);
            lines.push(line);
        }
    }

    for item in &snapshot.excavation_items {
        let stations = item.method.stations();
        if !stations.is_empty() {
            let sorted = sort_stations(stations)?;
            if let (Some(first), Some(last)) = (sorted.first(), sorted.last()) {
                trace.record(&TraceEvent::StationsSorted {
                    count: sorted.len(),
                    first_chainage: first.chainage,
                    last_chainage: last.chainage,
                });
            }
        }
        let line = excavation_takeoff(item)?;
        record_line(trace, &line);
        lines.push(line);
    }

    let warnings = catalog_warnings(&lines, catalog);
    let summary = summarize(&lines, snapshot.element_instances.len(), finish_area_by_category);

    Ok(CalcRun {
        meta: RunMetadata {
            run_id: Uuid::new_v4(),
            project_name: snapshot.meta.project_name.clone(),
            project_code: snapshot.meta.project_code.clone(),
            schema_version: snapshot.meta.version.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            calculated_at: Utc::now(),
        },
        lines,
        summary,
        warnings,
    })
}

fn catalog_warnings(lines: &[TakeoffLine], catalog: &dyn PayItemCatalog) -> Vec<String> {
    let mut warnings = Vec::new();
    for line in lines {
        let Some(item_number) = line.dpwh_item_number.as_deref() else {
            continue;
        };
        match catalog.lookup(item_number) {
            None => warnings.push(format!(
                "Pay item '{}' on {} ({}) is not in the catalog",
                item_number, line.source_element_id, line.resource_key
            )),
            Some(item) if item.unit != line.unit => warnings.push(format!(
                "Pay item '{}' is measured in {} but {} ({}) is in {}",
                item_number, item.unit, line.source_element_id, line.resource_key, line.unit
            )),
            Some(_) => {}
        }
    }
    warnings
}

fn summarize(
    lines: &[TakeoffLine],
    element_count: usize,
    finish_area_by_category: BTreeMap<FinishCategory, f64>,
) -> RunSummary {
    let total = |trade: Trade, unit: Unit| {
        round_to(
            lines
                .iter()
                .filter(|l| l.trade == trade && l.unit == unit)
                .map(|l| l.quantity)
                .sum(),
            6,
        )
    };

    RunSummary {
        total_concrete_m3: total(Trade::Concrete, Unit::CubicMeter),
        total_rebar_kg: total(Trade::Rebar, Unit::Kilogram),
        total_formwork_m2: total(Trade::Formwork, Unit::SquareMeter),
        total_excavation_m3: total(Trade::Earthwork, Unit::CubicMeter),
        element_count,
        line_count: lines.len(),
        finish_area_by_category: finish_area_by_category
            .into_iter()
            .map(|(category, area)| (category, round_to(area, 6)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::finishes::{AssignmentOverrides, FinishType, SpaceFinishAssignment};
    use crate::geometry::{GridRectBoundary, SpaceBoundary};
    use crate::grid::{GridLine, Level};
    use crate::trace::{CollectingTrace, NOOP_TRACE};

    fn snapshot() -> ProjectSnapshot {
        let mut s = ProjectSnapshot::new("Test", "T-1");
        s.grid.grid_x = vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0)];
        s.grid.grid_y = vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0)];
        s.levels = vec![Level::new("L1", 0.0), Level::new("L2", 3.0)];
        s.spaces = vec![Space {
            id: "S1".into(),
            name: "Living".into(),
            level_id: "L1".into(),
            boundary: SpaceBoundary::GridRect(GridRectBoundary::new(["A", "B"], ["1", "2"])),
            computed: Default::default(),
            tags: vec![],
            open_to_below: false,
        }];
        s.finish_types = vec![serde_json::from_str(
            r#"{"id":"FT-TILE","category":"floor","finish_name":"Tiles","dpwh_item_number_raw":"1018 (1)","unit":"m2"}"#,
        )
        .unwrap()];
        s.space_finish_assignments = vec![SpaceFinishAssignment {
            id: "A1".into(),
            space_id: "S1".into(),
            finish_type_id: "FT-TILE".into(),
            scope: "base".into(),
            overrides: AssignmentOverrides::default(),
        }];
        s
    }

    #[test]
    fn test_floor_run_recomputes_geometry() {
        let run = run_calculation(&snapshot(), &InMemoryCatalog::dpwh_defaults(), &NOOP_TRACE).unwrap();
        assert_eq!(run.lines.len(), 1);
        assert_eq!(run.lines[0].quantity, 30.0);
        assert_eq!(run.summary.finish_area_by_category[&FinishCategory::Floor], 30.0);
        assert!(run.warnings.is_empty());
    }

    #[test]
    fn test_missing_finish_type() {
        let mut s = snapshot();
        s.space_finish_assignments[0].finish_type_id = "FT-NONE".into();
        let err = run_calculation(&s, &InMemoryCatalog::new(), &NOOP_TRACE).unwrap_err();
        assert_eq!(err, CalcError::NotFound { kind: "Finish type".into(), id: "FT-NONE".into() });
    }

    #[test]
    fn test_invalid_settings_abort_run() {
        let mut s = snapshot();
        s.settings.default_rounding = 400;
        let err = run_calculation(&s, &InMemoryCatalog::new(), &NOOP_TRACE).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { .. }));
    }

    #[test]
    fn test_space_on_unknown_level() {
        let mut s = snapshot();
        s.spaces[0].level_id = "L9".into();
        let err = run_calculation(&s, &InMemoryCatalog::new(), &NOOP_TRACE).unwrap_err();
        assert!(matches!(err, CalcError::LevelNotFound { .. }));
    }

    #[test]
    fn test_unknown_pay_item_warns() {
        let mut s = snapshot();
        s.finish_types[0] = FinishType {
            dpwh_item_number_raw: "1099 (9)".into(),
            ..s.finish_types[0].clone()
        };
        let run = run_calculation(&s, &InMemoryCatalog::dpwh_defaults(), &NOOP_TRACE).unwrap();
        assert_eq!(run.warnings.len(), 1);
        assert!(run.warnings[0].contains("1099 (9)"));
    }

    #[test]
    fn test_trace_records_quantities() {
        let trace = CollectingTrace::new();
        run_calculation(&snapshot(), &InMemoryCatalog::new(), &trace).unwrap();
        let events = trace.events();
        assert!(events.iter().any(|e| matches!(e, TraceEvent::GridResolved { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, TraceEvent::QuantityComputed { quantity, .. } if *quantity == 30.0)));
    }

    #[test]
    fn test_snapshot_is_not_modified() {
        let s = snapshot();
        run_calculation(&s, &InMemoryCatalog::new(), &NOOP_TRACE).unwrap();
        assert_eq!(s.spaces[0].computed.area_m2, 0.0);
    }
}
