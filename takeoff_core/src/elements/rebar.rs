//! # Reinforcing Steel
//!
//! Bar weights from a template's [`RebarConfig`] and the resolved extent of
//! an element. Unit weight of a deformed bar is `d² / 162` kg/m with `d` in
//! millimetres.
//!
//! ## Layouts
//!
//! - **Linear** (beams, columns): main bars run the full length; stirrups or
//!   ties wrap the section inside the cover at the given spacing.
//! - **Footing**: main bars run along the footing length (inside cover),
//!   secondary bars run across it at the given spacing.
//! - **Slab**: a mesh measured per square metre. Main bars are given as a
//!   count per metre width, secondary bars by spacing.
//!
//! ## Grade selection
//!
//! `Auto` picks Grade 60 (`902 (1) a2`) when the largest bar diameter
//! reaches the configured threshold, otherwise Grade 40 (`902 (1) a1`).

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::{format_fixed, format_input, round_to};

/// Pay item for Grade 40 reinforcing steel
pub const GRADE_40_ITEM: &str = "902 (1) a1";
/// Pay item for Grade 60 reinforcing steel
pub const GRADE_60_ITEM: &str = "902 (1) a2";

/// Default concrete cover (m)
pub const DEFAULT_COVER_M: f64 = 0.04;

/// Unit weight of a bar in kg/m.
pub fn unit_weight_kg_per_m(diameter_mm: f64) -> f64 {
    diameter_mm * diameter_mm / 162.0
}

/// A fixed number of bars of one diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSet {
    pub count: u32,
    pub diameter_mm: f64,
}

/// Bars placed at a regular spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacedBars {
    pub diameter_mm: f64,
    pub spacing_m: f64,
}

/// How the steel grade pay item is chosen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum RebarGrade {
    #[default]
    Auto,
    Manual { item_number: String },
}

fn default_cover() -> f64 {
    DEFAULT_COVER_M
}

/// Reinforcement of an element template.
///
/// ## JSON Example
///
/// ```json
/// {
///   "main_bars": { "count": 4, "diameter_mm": 16 },
///   "stirrups": { "diameter_mm": 10, "spacing_m": 0.15 },
///   "cover_m": 0.04,
///   "grade": { "mode": "auto" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarConfig {
    pub main_bars: BarSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stirrups: Option<SpacedBars>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_bars: Option<SpacedBars>,
    #[serde(default = "default_cover")]
    pub cover_m: f64,
    #[serde(default)]
    pub grade: RebarGrade,
}

impl RebarConfig {
    /// Largest diameter across every bar set
    pub fn max_diameter_mm(&self) -> f64 {
        [
            Some(self.main_bars.diameter_mm),
            self.stirrups.map(|s| s.diameter_mm),
            self.secondary_bars.map(|s| s.diameter_mm),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f64::max)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !(self.main_bars.diameter_mm > 0.0) {
            return Err(CalcError::invalid_dimension(
                "main_bars.diameter_mm",
                self.main_bars.diameter_mm,
                "Bar diameter must be positive",
            ));
        }
        for (field, bars) in [("stirrups", self.stirrups), ("secondary_bars", self.secondary_bars)] {
            if let Some(bars) = bars {
                if !(bars.diameter_mm > 0.0) {
                    return Err(CalcError::invalid_dimension(
                        format!("{}.diameter_mm", field),
                        bars.diameter_mm,
                        "Bar diameter must be positive",
                    ));
                }
                if !(bars.spacing_m > 0.0) {
                    return Err(CalcError::invalid_dimension(
                        format!("{}.spacing_m", field),
                        bars.spacing_m,
                        "Spacing must be positive",
                    ));
                }
            }
        }
        if !(self.cover_m >= 0.0) {
            return Err(CalcError::invalid_dimension("cover_m", self.cover_m, "Cover cannot be negative"));
        }
        if let RebarGrade::Manual { item_number } = &self.grade {
            if item_number.trim().is_empty() {
                return Err(CalcError::missing_field("grade.item_number"));
            }
        }
        Ok(())
    }
}

/// Pick the grade pay item. Returns `(item_number, auto_selected)`.
pub fn select_grade(config: &RebarConfig, grade60_min_diameter_mm: f64) -> (String, bool) {
    match &config.grade {
        RebarGrade::Manual { item_number } => (item_number.trim().to_string(), false),
        RebarGrade::Auto => {
            let item = if config.max_diameter_mm() >= grade60_min_diameter_mm {
                GRADE_60_ITEM
            } else {
                GRADE_40_ITEM
            };
            (item.to_string(), true)
        }
    }
}

/// Upper bound on bars placed at a spacing along one element
pub const MAX_SPACED_BARS: f64 = 100_000.0;

/// Bars needed at `spacing_m` over `length_m`, both ends included.
///
/// Fails with `InvalidDimension` when the spacing is so small that the count
/// is not finite or exceeds [`MAX_SPACED_BARS`].
pub fn spaced_bar_count(length_m: f64, spacing_m: f64) -> CalcResult<u32> {
    // tolerance keeps 6.0 / 0.15 from landing just below 40
    let count = (length_m / spacing_m + 1e-9).floor() + 1.0;
    if !count.is_finite() || !(0.0..=MAX_SPACED_BARS).contains(&count) {
        return Err(CalcError::invalid_dimension(
            "spacing_m",
            spacing_m,
            format!(
                "Spacing over {} m gives more than {} bars",
                format_input(length_m),
                MAX_SPACED_BARS
            ),
        ));
    }
    Ok(count as u32)
}

/// Extent of the concrete the steel is placed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RebarLayout {
    /// Beam or column: bars along `length_m`, section `width_m` × `depth_m`
    Linear { length_m: f64, width_m: f64, depth_m: f64 },
    /// Isolated footing, plan `length_m` × `width_m`
    Footing { length_m: f64, width_m: f64 },
    /// Slab of plan area `area_m2`
    Slab { area_m2: f64 },
}

/// Role of a group of bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarRole {
    Main,
    Stirrup,
    Secondary,
}

/// One group of identical bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarRow {
    pub role: BarRole,
    pub bar_count: f64,
    /// Length of each bar (m)
    pub length_m: f64,
    pub diameter_mm: f64,
    pub weight_kg: f64,
}

impl RebarRow {
    fn new(role: BarRole, bar_count: f64, length_m: f64, diameter_mm: f64) -> Self {
        RebarRow {
            role,
            bar_count,
            length_m,
            diameter_mm,
            weight_kg: bar_count * length_m * unit_weight_kg_per_m(diameter_mm),
        }
    }

    fn term(&self) -> String {
        format!(
            "{} × {} × {}²/162",
            format_input(round_to(self.bar_count, 6)),
            format_input(round_to(self.length_m, 6)),
            format_input(self.diameter_mm)
        )
    }
}

/// Rebar weight of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarTakeoff {
    pub rows: Vec<RebarRow>,
    /// Unrounded total (kg)
    pub total_kg: f64,
    pub item_number: String,
    pub auto_selected: bool,
    pub formula_text: String,
}

fn inside_cover(field: &str, dimension_m: f64, cover_m: f64) -> CalcResult<f64> {
    let clear = dimension_m - 2.0 * cover_m;
    if clear <= 0.0 {
        return Err(CalcError::invalid_dimension(
            "cover_m",
            cover_m,
            format!("Cover leaves no room for bars across {} ({} m)", field, format_input(dimension_m)),
        ));
    }
    Ok(clear)
}

fn not_applicable(field: &str, layout: &str) -> CalcError {
    CalcError::invalid_input(field, "present", format!("{} do not apply to {} elements", field, layout))
}

/// Compute bar rows, total weight and grade item for `config` placed in `layout`.
///
/// ```rust
/// use takeoff_core::elements::rebar::{rebar_takeoff, BarSet, RebarConfig, RebarGrade, RebarLayout};
///
/// let config = RebarConfig {
///     main_bars: BarSet { count: 4, diameter_mm: 18.0 },
///     stirrups: None,
///     secondary_bars: None,
///     cover_m: 0.04,
///     grade: RebarGrade::Auto,
/// };
/// let layout = RebarLayout::Linear { length_m: 6.0, width_m: 0.3, depth_m: 0.5 };
/// let result = rebar_takeoff(&config, layout, 16.0).unwrap();
/// assert_eq!(result.total_kg, 48.0); // 4 × 6 × 18²/162
/// assert_eq!(result.item_number, "902 (1) a2");
/// ```
pub fn rebar_takeoff(config: &RebarConfig, layout: RebarLayout, grade60_min_diameter_mm: f64) -> CalcResult<RebarTakeoff> {
    config.validate()?;
    let main = config.main_bars;
    let cover = config.cover_m;

    let mut rows = Vec::new();
    match layout {
        RebarLayout::Linear {
            length_m,
            width_m,
            depth_m,
        } => {
            if config.secondary_bars.is_some() {
                return Err(not_applicable("secondary_bars", "beam or column"));
            }
            rows.push(RebarRow::new(BarRole::Main, main.count as f64, length_m, main.diameter_mm));
            if let Some(stirrups) = config.stirrups {
                let clear_w = inside_cover("width", width_m, cover)?;
                let clear_d = inside_cover("depth", depth_m, cover)?;
                let count = spaced_bar_count(length_m, stirrups.spacing_m)?;
                rows.push(RebarRow::new(
                    BarRole::Stirrup,
                    count as f64,
                    2.0 * (clear_w + clear_d),
                    stirrups.diameter_mm,
                ));
            }
        }
        RebarLayout::Footing { length_m, width_m } => {
            if config.stirrups.is_some() {
                return Err(not_applicable("stirrups", "footing"));
            }
            let clear_l = inside_cover("length", length_m, cover)?;
            let clear_w = inside_cover("width", width_m, cover)?;
            rows.push(RebarRow::new(BarRole::Main, main.count as f64, clear_l, main.diameter_mm));
            if let Some(secondary) = config.secondary_bars {
                let count = spaced_bar_count(clear_l, secondary.spacing_m)?;
                rows.push(RebarRow::new(BarRole::Secondary, count as f64, clear_w, secondary.diameter_mm));
            }
        }
        RebarLayout::Slab { area_m2 } => {
            if config.stirrups.is_some() {
                return Err(not_applicable("stirrups", "slab"));
            }
            // bars per metre width give metres of bar per square metre
            rows.push(RebarRow::new(BarRole::Main, area_m2, main.count as f64, main.diameter_mm));
            if let Some(secondary) = config.secondary_bars {
                rows.push(RebarRow::new(
                    BarRole::Secondary,
                    area_m2,
                    1.0 / secondary.spacing_m,
                    secondary.diameter_mm,
                ));
            }
        }
    }

    let total: f64 = rows.iter().map(|r| r.weight_kg).sum();
    let terms: Vec<String> = rows.iter().map(RebarRow::term).collect();
    let (item_number, auto_selected) = select_grade(config, grade60_min_diameter_mm);

    Ok(RebarTakeoff {
        formula_text: format!(
            "W = Σ n × L × d²/162 = {} = {} kg",
            terms.join(" + "),
            format_fixed(total, 3)
        ),
        rows,
        total_kg: total,
        item_number,
        auto_selected,
    })
}
