//! # Structural Elements
//!
//! Concrete, formwork and reinforcing steel quantities for beams, columns,
//! slabs and isolated footings.
//!
//! An [`ElementTemplate`] holds the section and reinforcement shared by many
//! members ("B-1 300×500"). An [`ElementInstance`] places a template on the
//! model by grid and level labels. The placement is resolved through the same
//! label indices as spaces and wall surfaces, so a bad label fails the same
//! way.
//!
//! | Kind       | Extent                      | Concrete      | Formwork           |
//! |------------|-----------------------------|---------------|--------------------|
//! | Beam       | span length along grid line | b × d × L     | (2d + b) × L       |
//! | Column     | level to level_top          | b × d × H     | 2(b + d) × H       |
//! | Slab       | boundary area               | A × t         | A (soffit)         |
//! | Foundation | fixed plan size             | L × W × D     | 2(L + W) × D       |
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "id": "TPL-B1",
//!   "name": "B-1 300x500",
//!   "kind": { "type": "beam", "width_m": 0.3, "depth_m": 0.5 },
//!   "concrete_item": "900 (1) c",
//!   "rebar": { "main_bars": { "count": 4, "diameter_mm": 16 }, "stirrups": { "diameter_mm": 10, "spacing_m": 0.15 } }
//! }
//! ```

pub mod rebar;

pub use rebar::{rebar_takeoff, RebarConfig, RebarGrade, RebarLayout, RebarTakeoff};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::formulas::Formula;
use crate::geometry::{compute_boundary_geometry, compute_grid_span_length, SpaceBoundary, WallGridLine};
use crate::grid::{GridIndex, LevelIndex};
use crate::project::CalcSettings;
use crate::takeoff::{Assumption, LineBuilder, TakeoffLine, Trade};
use crate::units::{format_fixed, format_input, round_to, Unit};

/// Default pay item for structural concrete
pub const DEFAULT_CONCRETE_ITEM: &str = "900 (1) c";
/// Default pay item for formworks and falseworks
pub const DEFAULT_FORMWORK_ITEM: &str = "903 (1)";

/// Section or plan dimensions of a template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Beam { width_m: f64, depth_m: f64 },
    Column { width_m: f64, depth_m: f64 },
    Slab { thickness_m: f64 },
    Foundation { length_m: f64, width_m: f64, depth_m: f64 },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Beam { .. } => "beam",
            ElementKind::Column { .. } => "column",
            ElementKind::Slab { .. } => "slab",
            ElementKind::Foundation { .. } => "foundation",
        }
    }

    /// Every dimension must be strictly positive.
    pub fn validate(&self) -> CalcResult<()> {
        let dims: Vec<(&str, f64)> = match *self {
            ElementKind::Beam { width_m, depth_m } | ElementKind::Column { width_m, depth_m } => {
                vec![("width_m", width_m), ("depth_m", depth_m)]
            }
            ElementKind::Slab { thickness_m } => vec![("thickness_m", thickness_m)],
            ElementKind::Foundation {
                length_m,
                width_m,
                depth_m,
            } => vec![("length_m", length_m), ("width_m", width_m), ("depth_m", depth_m)],
        };
        for (field, value) in dims {
            if !(value > 0.0) || !value.is_finite() {
                return Err(CalcError::invalid_dimension(field, value, "Dimension must be positive"));
            }
        }
        Ok(())
    }
}

/// Reusable member definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTemplate {
    pub id: String,
    pub name: String,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concrete_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formwork_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebar: Option<RebarConfig>,
}

impl ElementTemplate {
    fn item_or(item: &Option<String>, default: &str) -> String {
        item.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    pub fn concrete_item_number(&self) -> String {
        Self::item_or(&self.concrete_item, DEFAULT_CONCRETE_ITEM)
    }

    pub fn formwork_item_number(&self) -> String {
        Self::item_or(&self.formwork_item, DEFAULT_FORMWORK_ITEM)
    }
}

/// Where an instance sits, by grid and level labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Placement {
    /// Along a grid line between two cross-axis labels
    Beam { grid_line: WallGridLine },
    /// At a grid intersection, from the instance level up to `level_top`
    Column { x: String, y: String, level_top: String },
    /// Over a boundary on the instance level
    Slab { boundary: SpaceBoundary },
    /// At a grid intersection
    Foundation { x: String, y: String },
}

impl Placement {
    pub fn name(&self) -> &'static str {
        match self {
            Placement::Beam { .. } => "beam",
            Placement::Column { .. } => "column",
            Placement::Slab { .. } => "slab",
            Placement::Foundation { .. } => "foundation",
        }
    }
}

/// One placed member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInstance {
    pub id: String,
    pub template_id: String,
    /// Label of the level the member sits on
    pub level_id: String,
    pub placement: Placement,
}

/// Resolved size of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ElementExtent {
    Beam { length_m: f64 },
    Column { height_m: f64 },
    Slab { area_m2: f64 },
    Foundation,
}

/// Resolve the placement of `instance` to an extent.
pub fn resolve_extent(
    instance: &ElementInstance,
    template: &ElementTemplate,
    grid: &GridIndex,
    levels: &LevelIndex,
) -> CalcResult<ElementExtent> {
    levels.elevation(&instance.level_id)?;

    match (&template.kind, &instance.placement) {
        (ElementKind::Beam { .. }, Placement::Beam { grid_line }) => {
            let length = compute_grid_span_length(grid_line, grid)?;
            if length <= 0.0 {
                return Err(CalcError::invalid_dimension("length_m", length, "Beam span has zero length"));
            }
            Ok(ElementExtent::Beam { length_m: length })
        }
        (ElementKind::Column { .. }, Placement::Column { x, y, level_top }) => {
            grid.offset_x(x)?;
            grid.offset_y(y)?;
            let height = levels.elevation(level_top)? - levels.elevation(&instance.level_id)?;
            if height <= 0.0 {
                return Err(CalcError::invalid_dimension(
                    "level_top",
                    height,
                    format!("Level '{}' is not above '{}'", level_top, instance.level_id),
                ));
            }
            Ok(ElementExtent::Column { height_m: height })
        }
        (ElementKind::Slab { .. }, Placement::Slab { boundary }) => {
            let geometry = compute_boundary_geometry(boundary, grid)?;
            Ok(ElementExtent::Slab {
                area_m2: geometry.area_m2,
            })
        }
        (ElementKind::Foundation { .. }, Placement::Foundation { x, y }) => {
            grid.offset_x(x)?;
            grid.offset_y(y)?;
            Ok(ElementExtent::Foundation)
        }
        (kind, placement) => Err(CalcError::invalid_input(
            "placement",
            placement.name(),
            format!("Placement does not match template kind '{}'", kind.name()),
        )),
    }
}

/// A quantity with its formula text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementQuantity {
    /// Unrounded
    pub value: f64,
    pub formula_text: String,
}

fn num(value: f64) -> String {
    format_input(round_to(value, 6))
}

/// Concrete volume, with `waste` (fraction) applied when positive.
pub fn concrete_volume(kind: &ElementKind, extent: &ElementExtent, waste: f64, rounding: u32) -> CalcResult<ElementQuantity> {
    let (symbolic, numeric, volume) = match (kind, extent) {
        (ElementKind::Beam { width_m, depth_m }, ElementExtent::Beam { length_m }) => (
            "b × d × L",
            format!("{} × {} × {}", num(*width_m), num(*depth_m), num(*length_m)),
            width_m * depth_m * length_m,
        ),
        (ElementKind::Column { width_m, depth_m }, ElementExtent::Column { height_m }) => (
            "b × d × H",
            format!("{} × {} × {}", num(*width_m), num(*depth_m), num(*height_m)),
            width_m * depth_m * height_m,
        ),
        (ElementKind::Slab { thickness_m }, ElementExtent::Slab { area_m2 }) => (
            "A × t",
            format!("{} × {}", num(*area_m2), num(*thickness_m)),
            area_m2 * thickness_m,
        ),
        (
            ElementKind::Foundation {
                length_m,
                width_m,
                depth_m,
            },
            ElementExtent::Foundation,
        ) => (
            "L × W × D",
            format!("{} × {} × {}", num(*length_m), num(*width_m), num(*depth_m)),
            length_m * width_m * depth_m,
        ),
        _ => return Err(mismatch(kind)),
    };

    let (value, formula_text) = if waste > 0.0 && volume > 0.0 {
        let value = volume * (1.0 + waste);
        (
            value,
            format!(
                "V = {} × (1 + waste) = {} × (1 + {}) = {} m³",
                symbolic,
                numeric,
                format_input(waste),
                format_fixed(value, rounding)
            ),
        )
    } else {
        (
            volume,
            format!("V = {} = {} = {} m³", symbolic, numeric, format_fixed(volume, rounding)),
        )
    };
    Ok(ElementQuantity { value, formula_text })
}

/// Formwork contact area.
pub fn formwork_area(kind: &ElementKind, extent: &ElementExtent, rounding: u32) -> CalcResult<ElementQuantity> {
    let (symbolic, numeric, area) = match (kind, extent) {
        (ElementKind::Beam { width_m, depth_m }, ElementExtent::Beam { length_m }) => (
            "(2 × d + b) × L",
            format!("(2 × {} + {}) × {}", num(*depth_m), num(*width_m), num(*length_m)),
            (2.0 * depth_m + width_m) * length_m,
        ),
        (ElementKind::Column { width_m, depth_m }, ElementExtent::Column { height_m }) => (
            "2 × (b + d) × H",
            format!("2 × ({} + {}) × {}", num(*width_m), num(*depth_m), num(*height_m)),
            2.0 * (width_m + depth_m) * height_m,
        ),
        (ElementKind::Slab { .. }, ElementExtent::Slab { area_m2 }) => ("A", num(*area_m2), *area_m2),
        (
            ElementKind::Foundation {
                length_m,
                width_m,
                depth_m,
            },
            ElementExtent::Foundation,
        ) => (
            "2 × (L + W) × D",
            format!("2 × ({} + {}) × {}", num(*length_m), num(*width_m), num(*depth_m)),
            2.0 * (length_m + width_m) * depth_m,
        ),
        _ => return Err(mismatch(kind)),
    };
    Ok(ElementQuantity {
        value: area,
        formula_text: format!("F = {} = {} = {} m²", symbolic, numeric, format_fixed(area, rounding)),
    })
}

fn mismatch(kind: &ElementKind) -> CalcError {
    CalcError::invalid_input("extent", kind.name(), "Extent does not match template kind")
}

/// Steel layout implied by a template and its resolved extent.
pub fn rebar_layout(kind: &ElementKind, extent: &ElementExtent) -> CalcResult<RebarLayout> {
    match (kind, extent) {
        (ElementKind::Beam { width_m, depth_m }, ElementExtent::Beam { length_m }) => Ok(RebarLayout::Linear {
            length_m: *length_m,
            width_m: *width_m,
            depth_m: *depth_m,
        }),
        (ElementKind::Column { width_m, depth_m }, ElementExtent::Column { height_m }) => Ok(RebarLayout::Linear {
            length_m: *height_m,
            width_m: *width_m,
            depth_m: *depth_m,
        }),
        (ElementKind::Slab { .. }, ElementExtent::Slab { area_m2 }) => Ok(RebarLayout::Slab { area_m2: *area_m2 }),
        (ElementKind::Foundation { length_m, width_m, .. }, ElementExtent::Foundation) => Ok(RebarLayout::Footing {
            length_m: *length_m,
            width_m: *width_m,
        }),
        _ => Err(mismatch(kind)),
    }
}

fn extent_inputs(builder: LineBuilder, extent: &ElementExtent) -> LineBuilder {
    match extent {
        ElementExtent::Beam { length_m } => builder.input("length_m", *length_m),
        ElementExtent::Column { height_m } => builder.input("height_m", *height_m),
        ElementExtent::Slab { area_m2 } => builder.input("area_m2", *area_m2),
        ElementExtent::Foundation => builder,
    }
}

fn kind_inputs(builder: LineBuilder, kind: &ElementKind) -> LineBuilder {
    match kind {
        ElementKind::Beam { width_m, depth_m } | ElementKind::Column { width_m, depth_m } => {
            builder.input("width_m", *width_m).input("depth_m", *depth_m)
        }
        ElementKind::Slab { thickness_m } => builder.input("thickness_m", *thickness_m),
        ElementKind::Foundation {
            length_m,
            width_m,
            depth_m,
        } => builder
            .input("length_m", *length_m)
            .input("width_m", *width_m)
            .input("depth_m", *depth_m),
    }
}

/// Concrete, formwork and (when configured) rebar lines for one instance.
///
/// ```rust
/// use takeoff_core::elements::{element_takeoff, ElementInstance, ElementKind, ElementTemplate, Placement};
/// use takeoff_core::geometry::WallGridLine;
/// use takeoff_core::grid::{Axis, GridIndex, GridLine, GridSystem, Level, LevelIndex};
/// use takeoff_core::project::CalcSettings;
///
/// let grid = GridSystem {
///     grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0)],
///     grid_y: vec![GridLine::new("1", 0.0), GridLine::new("2", 6.0)],
/// };
/// let levels = vec![Level::new("L1", 0.0), Level::new("L2", 3.0)];
/// let template = ElementTemplate {
///     id: "TPL-B1".into(),
///     name: "B-1".into(),
///     kind: ElementKind::Beam { width_m: 0.3, depth_m: 0.5 },
///     concrete_item: None,
///     formwork_item: None,
///     rebar: None,
/// };
/// let beam = ElementInstance {
///     id: "B1-A".into(),
///     template_id: "TPL-B1".into(),
///     level_id: "L2".into(),
///     placement: Placement::Beam { grid_line: WallGridLine::new(Axis::X, "A", ["1", "2"]) },
/// };
/// let lines = element_takeoff(
///     &beam,
///     &template,
///     &GridIndex::new(&grid),
///     &LevelIndex::new(&levels),
///     &CalcSettings::default(),
/// ).unwrap();
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].quantity, 0.9);  // 0.3 × 0.5 × 6
/// assert_eq!(lines[1].quantity, 7.8);  // (2 × 0.5 + 0.3) × 6
/// ```
pub fn element_takeoff(
    instance: &ElementInstance,
    template: &ElementTemplate,
    grid: &GridIndex,
    levels: &LevelIndex,
    settings: &CalcSettings,
) -> CalcResult<Vec<TakeoffLine>> {
    template.kind.validate()?;
    settings.validate()?;
    let waste = settings.concrete_waste_percent;
    let rounding = settings.default_rounding;

    let extent = resolve_extent(instance, template, grid, levels)?;
    let kind_name = template.kind.name();

    let base = |trade: Trade, key: &str, unit: Unit, formula: Formula, item: String| {
        let builder = LineBuilder::new(&instance.id, trade, key, unit, formula)
            .tags(["structural", kind_name])
            .dpwh_item(Some(item))
            .template(template.id.clone())
            .level(instance.level_id.clone());
        extent_inputs(kind_inputs(builder, &template.kind), &extent)
    };

    let mut lines = Vec::with_capacity(3);

    let concrete = concrete_volume(&template.kind, &extent, waste, rounding)?;
    lines.push(
        base(
            Trade::Concrete,
            "concrete",
            Unit::CubicMeter,
            Formula::ConcreteVolume,
            template.concrete_item_number(),
        )
        .input("waste_percent", waste)
        .assume_if(waste > 0.0, Assumption::Waste { percent: waste })
        .formula_text(concrete.formula_text)
        .build(round_to(concrete.value, rounding)),
    );

    let formwork = formwork_area(&template.kind, &extent, rounding)?;
    lines.push(
        base(
            Trade::Formwork,
            "formwork",
            Unit::SquareMeter,
            Formula::FormworkContactArea,
            template.formwork_item_number(),
        )
        .formula_text(formwork.formula_text)
        .build(round_to(formwork.value, rounding)),
    );

    if let Some(config) = &template.rebar {
        let layout = rebar_layout(&template.kind, &extent)?;
        let steel = rebar_takeoff(config, layout, settings.rebar_grade60_min_diameter_mm)?;
        lines.push(
            base(
                Trade::Rebar,
                "rebar",
                Unit::Kilogram,
                Formula::RebarWeight,
                steel.item_number.clone(),
            )
            .input("cover_m", config.cover_m)
            .input("max_diameter_mm", config.max_diameter_mm())
            .assume(Assumption::RebarGrade {
                item_number: steel.item_number.clone(),
                auto_selected: steel.auto_selected,
            })
            .formula_text(steel.formula_text)
            .build(round_to(steel.total_kg, rounding)),
        );
    }

    Ok(lines)
}
