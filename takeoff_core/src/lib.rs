//! # takeoff_core - Quantity Takeoff Calculation Engine
//!
//! `takeoff_core` turns a structured description of a building or civil work
//! (grid lines, levels, spaces, wall surfaces, openings, structural members,
//! excavation stations) into bill-of-quantities lines, each carrying the
//! formula, literal inputs and assumptions that produced it.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over an immutable project snapshot
//! - **JSON-First**: All inputs and outputs implement Serialize/Deserialize
//! - **Rich Errors**: A missing grid label fails the run; nothing defaults silently
//! - **Auditable**: Every quantity renders its arithmetic with the literal inputs
//!
//! ## Quick Start
//!
//! ```rust
//! use takeoff_core::catalog::InMemoryCatalog;
//! use takeoff_core::classification::ReportView;
//! use takeoff_core::project::ProjectSnapshot;
//! use takeoff_core::run::run_calculation;
//! use takeoff_core::trace::NOOP_TRACE;
//!
//! let snapshot: ProjectSnapshot = serde_json::from_str(r#"{
//!     "meta": { "version": "0.1.0", "created": "2024-05-01T08:00:00Z", "modified": "2024-05-01T08:00:00Z" },
//!     "grid": {
//!         "grid_x": [{ "label": "A", "offset": 0 }, { "label": "B", "offset": 5 }],
//!         "grid_y": [{ "label": "1", "offset": 0 }, { "label": "2", "offset": 6 }]
//!     },
//!     "levels": [{ "label": "L1", "elevation": 0 }, { "label": "L2", "elevation": 3 }],
//!     "spaces": [{
//!         "id": "S1", "name": "Living", "level_id": "L1",
//!         "boundary": { "type": "gridRect", "grid_x": ["A", "B"], "grid_y": ["1", "2"] }
//!     }],
//!     "finish_types": [{
//!         "id": "FT-TILE", "category": "floor", "finish_name": "Ceramic tiles",
//!         "dpwh_item_number_raw": "1018 (1)", "unit": "m2",
//!         "assumptions": { "waste_percent": 0.05 }
//!     }],
//!     "space_finish_assignments": [{ "id": "A1", "space_id": "S1", "finish_type_id": "FT-TILE" }]
//! }"#).unwrap();
//!
//! let catalog = InMemoryCatalog::dpwh_defaults();
//! let run = run_calculation(&snapshot, &catalog, &NOOP_TRACE).unwrap();
//! assert_eq!(run.lines[0].quantity, 31.5);
//! assert_eq!(
//!     run.lines[0].formula_text,
//!     "Floor area = A × (1 + waste) = 30 × (1 + 0.05) = 31.500 m²"
//! );
//!
//! let boq = run.report(ReportView::Summarized, &catalog);
//! assert_eq!(boq.parts[0].label, "PART K");
//! ```
//!
//! ## Modules
//!
//! - [`grid`] - Grid line and level label resolution (label indices)
//! - [`geometry`] - Space, wall surface and opening geometry
//! - [`finishes`] - Finish types, assignments, opening deductions and finish takeoff
//! - [`excavation`] - Average end area, prismoidal, pit, trench and embankment volumes
//! - [`elements`] - Concrete, formwork and rebar for beams, columns, slabs and footings
//! - [`classification`] - DPWH Part classification and BOQ aggregation
//! - [`catalog`] - Pay-item catalog lookup
//! - [`run`] - Calc run over a project snapshot
//! - [`takeoff`] - Takeoff lines, assumptions and the line builder
//! - [`formulas`] - Formula registry for audit trails
//! - [`trace`] - Injectable diagnostic trace sink
//! - [`project`] - Project snapshot and calculation settings
//! - [`file_io`] - Snapshot loading and atomic run output
//! - [`units`] - Units of measure, rounding and number formatting
//! - [`errors`] - Structured error types

pub mod catalog;
pub mod classification;
pub mod elements;
pub mod errors;
pub mod excavation;
pub mod file_io;
pub mod finishes;
pub mod formulas;
pub mod geometry;
pub mod grid;
pub mod project;
pub mod run;
pub mod takeoff;
pub mod trace;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use catalog::{InMemoryCatalog, PayItem, PayItemCatalog};
pub use classification::{aggregate, classify, sort_dpwh_parts, BoqReport, DpwhPart, ReportView};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_snapshot, save_run};
pub use project::{CalcSettings, ProjectSnapshot};
pub use run::{run_calculation, CalcRun, RunSummary};
pub use takeoff::{TakeoffLine, Trade};
