//! # Takeoff Lines
//!
//! A [`TakeoffLine`] is the engine's output unit: one quantity tied to a
//! source element, a trade and (usually) a DPWH pay item, together with the
//! audit trail that produced it.
//!
//! Lines are created fresh on every calc run and never mutated. The
//! provenance (`formula_text`, `inputs_snapshot`, `assumptions`) is a pure
//! function of the inputs, so two runs over the same snapshot differ only in
//! `id`.
//!
//! ## Building a line
//!
//! Calculators collect inputs and structured [`Assumption`]s into a
//! [`LineBuilder`] and assemble the line once, at the end:
//!
//! ```rust
//! use takeoff_core::formulas::Formula;
//! use takeoff_core::takeoff::{Assumption, LineBuilder, Trade};
//! use takeoff_core::units::Unit;
//!
//! let line = LineBuilder::new("S1", Trade::Finishes, "finish:FT-1:base", Unit::SquareMeter, Formula::FloorFinish)
//!     .input("area_m2", 30.0)
//!     .input("waste_percent", 0.05)
//!     .assume(Assumption::Waste { percent: 0.05 })
//!     .formula_text("Floor area = A × (1 + waste) = 30 × (1 + 0.05) = 31.500 m²")
//!     .build(31.5);
//!
//! assert_eq!(line.quantity, 31.5);
//! assert_eq!(line.assumption_texts(), vec!["Waste allowance: 5%"]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::formulas::Formula;
use crate::units::{format_fixed, format_input, format_percent, Unit};

/// Trade a takeoff line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Trade {
    Earthwork,
    Concrete,
    Rebar,
    Formwork,
    Finishes,
}

impl Trade {
    pub fn display_name(&self) -> &'static str {
        match self {
            Trade::Earthwork => "Earthwork",
            Trade::Concrete => "Concrete",
            Trade::Rebar => "Reinforcing Steel",
            Trade::Formwork => "Formwork",
            Trade::Finishes => "Finishes",
        }
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Where a wall finish height came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightBasis {
    /// Finish type's fixed height rule (e.g. wainscot)
    FixedRule,
    /// Per-assignment height override
    AssignmentOverride,
    /// Storey height from the level above the space
    StoreyHeight,
    /// Full modeled height of a wall surface
    WallSurfaceHeight,
}

impl HeightBasis {
    pub fn display_name(&self) -> &'static str {
        match self {
            HeightBasis::FixedRule => "fixed height rule",
            HeightBasis::AssignmentOverride => "assignment override",
            HeightBasis::StoreyHeight => "storey height",
            HeightBasis::WallSurfaceHeight => "full wall surface height",
        }
    }
}

/// One structured assumption behind a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Assumption {
    /// Height used for a wall finish
    Height { basis: HeightBasis, height_m: f64 },
    /// Openings deducted under the finish type's deduction rule
    Deduction {
        min_area_m2: f64,
        include_types: Vec<String>,
        count: usize,
        total_area_m2: f64,
    },
    /// Non-zero waste allowance (fraction)
    Waste { percent: f64 },
    /// Finished sides of a wall surface
    Sides { count: u8, overridden: bool },
    /// Ceiling omitted because the space is open to below
    OpenToBelow,
    /// Compaction factor applied to fill
    Compaction { factor: f64 },
    /// Reinforcing steel grade and how it was chosen
    RebarGrade { item_number: String, auto_selected: bool },
    /// Free-form note
    Note { text: String },
}

impl std::fmt::Display for Assumption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Assumption::Height { basis, height_m } => {
                write!(f, "Height basis: {} ({} m)", basis.display_name(), format_input(*height_m))
            }
            Assumption::Deduction {
                min_area_m2,
                include_types,
                count,
                total_area_m2,
            } => {
                let types = if include_types.is_empty() {
                    "all types".to_string()
                } else {
                    include_types.join(", ")
                };
                write!(
                    f,
                    "Opening deduction: {} opening(s) of {} at least {} m², total {} m²",
                    count,
                    types,
                    format_input(*min_area_m2),
                    format_fixed(*total_area_m2, 3)
                )
            }
            Assumption::Waste { percent } => write!(f, "Waste allowance: {}", format_percent(*percent)),
            Assumption::Sides { count, overridden } => {
                if *overridden {
                    write!(f, "Sides finished: {} (assignment override)", count)
                } else {
                    write!(f, "Sides finished: {}", count)
                }
            }
            Assumption::OpenToBelow => write!(f, "Open to below: no ceiling finish"),
            Assumption::Compaction { factor } => write!(f, "Compaction factor: {}", format_input(*factor)),
            Assumption::RebarGrade {
                item_number,
                auto_selected,
            } => {
                if *auto_selected {
                    write!(f, "Rebar grade item {} (auto-selected by bar diameter)", item_number)
                } else {
                    write!(f, "Rebar grade item {}", item_number)
                }
            }
            Assumption::Note { text } => write!(f, "{}", text),
        }
    }
}

/// One computed quantity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoffLine {
    pub id: Uuid,
    pub source_element_id: String,
    pub trade: Trade,
    /// Semantic key of the line within its source (e.g. "finish:FT-1:base")
    pub resource_key: String,
    pub quantity: f64,
    pub unit: Unit,
    pub formula: Formula,
    pub formula_text: String,
    pub inputs_snapshot: BTreeMap<String, f64>,
    pub assumptions: Vec<Assumption>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpwh_item_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
}

impl TakeoffLine {
    /// Assumptions rendered as report strings
    pub fn assumption_texts(&self) -> Vec<String> {
        self.assumptions.iter().map(|a| a.to_string()).collect()
    }

    /// Key that identifies "the same line" across calc runs
    pub fn semantic_key(&self) -> (String, String) {
        (self.source_element_id.clone(), self.resource_key.clone())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Collects provenance for one line and assembles it at the end.
#[derive(Debug, Clone)]
pub struct LineBuilder {
    source_element_id: String,
    trade: Trade,
    resource_key: String,
    unit: Unit,
    formula: Formula,
    formula_text: String,
    inputs: BTreeMap<String, f64>,
    assumptions: Vec<Assumption>,
    tags: Vec<String>,
    dpwh_item_number: Option<String>,
    template_id: Option<String>,
    level_id: Option<String>,
}

impl LineBuilder {
    pub fn new(
        source_element_id: impl Into<String>,
        trade: Trade,
        resource_key: impl Into<String>,
        unit: Unit,
        formula: Formula,
    ) -> Self {
        LineBuilder {
            source_element_id: source_element_id.into(),
            trade,
            resource_key: resource_key.into(),
            unit,
            formula,
            formula_text: String::new(),
            inputs: BTreeMap::new(),
            assumptions: Vec::new(),
            tags: Vec::new(),
            dpwh_item_number: None,
            template_id: None,
            level_id: None,
        }
    }

    pub fn input(mut self, name: impl Into<String>, value: f64) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    pub fn assume(mut self, assumption: Assumption) -> Self {
        self.assumptions.push(assumption);
        self
    }

    /// Push an assumption only when `condition` holds
    pub fn assume_if(self, condition: bool, assumption: Assumption) -> Self {
        if condition {
            self.assume(assumption)
        } else {
            self
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn formula_text(mut self, text: impl Into<String>) -> Self {
        self.formula_text = text.into();
        self
    }

    pub fn dpwh_item(mut self, item_number: Option<String>) -> Self {
        self.dpwh_item_number = item_number.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn level(mut self, level_id: impl Into<String>) -> Self {
        self.level_id = Some(level_id.into());
        self
    }

    /// Assemble the immutable line with a fresh id.
    pub fn build(self, quantity: f64) -> TakeoffLine {
        TakeoffLine {
            id: Uuid::new_v4(),
            source_element_id: self.source_element_id,
            trade: self.trade,
            resource_key: self.resource_key,
            quantity,
            unit: self.unit,
            formula: self.formula,
            formula_text: self.formula_text,
            inputs_snapshot: self.inputs,
            assumptions: self.assumptions,
            tags: self.tags,
            dpwh_item_number: self.dpwh_item_number,
            template_id: self.template_id,
            level_id: self.level_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TakeoffLine {
        LineBuilder::new("W1", Trade::Finishes, "finish:PT-1:base", Unit::SquareMeter, Formula::WallSurfaceFinish)
            .input("gross_area_m2", 30.0)
            .assume(Assumption::Height { basis: HeightBasis::WallSurfaceHeight, height_m: 3.0 })
            .assume(Assumption::Deduction {
                min_area_m2: 0.5,
                include_types: vec!["door".into(), "window".into()],
                count: 2,
                total_area_m2: 3.69,
            })
            .assume_if(false, Assumption::Waste { percent: 0.0 })
            .tag("finish")
            .dpwh_item(Some("1032 (1) a".into()))
            .level("L1")
            .build(26.31)
    }

    #[test]
    fn test_builder_assembles_line() {
        let line = sample();
        assert_eq!(line.quantity, 26.31);
        assert_eq!(line.assumptions.len(), 2);
        assert_eq!(line.inputs_snapshot["gross_area_m2"], 30.0);
        assert_eq!(line.dpwh_item_number.as_deref(), Some("1032 (1) a"));
        assert!(line.template_id.is_none());
        assert!(line.has_tag("finish"));
    }

    #[test]
    fn test_assumption_texts() {
        let texts = sample().assumption_texts();
        assert_eq!(texts[0], "Height basis: full wall surface height (3 m)");
        assert_eq!(
            texts[1],
            "Opening deduction: 2 opening(s) of door, window at least 0.5 m², total 3.690 m²"
        );
    }

    #[test]
    fn test_blank_item_number_dropped() {
        let line = LineBuilder::new("S1", Trade::Finishes, "k", Unit::SquareMeter, Formula::FloorFinish)
            .dpwh_item(Some("  ".into()))
            .build(1.0);
        assert!(line.dpwh_item_number.is_none());
    }

    #[test]
    fn test_ids_differ_between_builds() {
        let a = sample();
        let b = sample();
        assert_ne!(a.id, b.id);
        assert_eq!(a.semantic_key(), b.semantic_key());
        assert_eq!(a.formula_text, b.formula_text);
    }

    #[test]
    fn test_line_serialization() {
        let line = sample();
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["unit"], "m2");
        assert_eq!(json["assumptions"][1]["kind"], "Deduction");
        assert!(json.get("template_id").is_none());
    }
}
