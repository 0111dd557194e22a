//! # Formula Registry
//!
//! Every quantity the engine produces is tagged with the [`Formula`] it was
//! derived with. The registry carries the human-readable formula and its
//! source so a reviewer can check a BOQ line against paper-based estimation
//! practice.
//!
//! ## Usage
//!
//! ```rust
//! use takeoff_core::formulas::Formula;
//!
//! let meta = Formula::AverageEndArea.metadata();
//! assert_eq!(meta.formula_plain, "V = Σ ((A1 + A2) / 2) × L");
//! ```

use serde::{Deserialize, Serialize};

/// Grouping used when rendering the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormulaCategory {
    Geometry,
    Finishes,
    Earthwork,
    Structural,
}

impl FormulaCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            FormulaCategory::Geometry => "Geometry",
            FormulaCategory::Finishes => "Finishes",
            FormulaCategory::Earthwork => "Earthwork",
            FormulaCategory::Structural => "Structural Elements",
        }
    }
}

/// Metadata for one formula.
#[derive(Debug, Clone)]
pub struct FormulaMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub formula_plain: &'static str,
    pub reference: &'static str,
    pub category: FormulaCategory,
}

/// All formulas used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Formula {
    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------
    /// A = w × l, P = 2(w + l)
    GridRectangle,
    /// A = |Σ(x_i·y_{i+1} − x_{i+1}·y_i)| / 2
    ShoelaceArea,
    /// P = Σ |p_{i+1} − p_i|
    PolygonPerimeter,
    /// A = w × h × n
    OpeningArea,
    /// A = L × H, total = A × sides
    WallGrossArea,

    // -------------------------------------------------------------------------
    // Finishes
    // -------------------------------------------------------------------------
    /// Q = A × (1 + waste)
    FloorFinish,
    /// Q = A × (1 + waste), 0 when open to below
    CeilingFinish,
    /// Q = max(0, P × H − D) × (1 + waste)
    PerimeterWallFinish,
    /// Q = max(0, L × H × S − D) × (1 + waste)
    WallSurfaceFinish,

    // -------------------------------------------------------------------------
    // Earthwork
    // -------------------------------------------------------------------------
    /// V = Σ ((A1 + A2)/2) × L
    AverageEndArea,
    /// V = (L/6)(A1 + 4Am + A2)
    Prismoidal,
    /// V = L × W × D
    RectangularPit,
    /// V = L × ((Wt + Wb)/2) × D
    SlopedTrench,
    /// V = V_avg × compaction
    Embankment,
    /// k = 1 / cos θ
    SlopeCorrection,

    // -------------------------------------------------------------------------
    // Structural elements
    // -------------------------------------------------------------------------
    /// V = b × d × L (and analogues)
    ConcreteVolume,
    /// Contact area of forms against concrete
    FormworkContactArea,
    /// W = Σ n × L × d²/162
    RebarWeight,
}

pub const ALL_FORMULAS: &[Formula] = &[
    Formula::GridRectangle,
    Formula::ShoelaceArea,
    Formula::PolygonPerimeter,
    Formula::OpeningArea,
    Formula::WallGrossArea,
    Formula::FloorFinish,
    Formula::CeilingFinish,
    Formula::PerimeterWallFinish,
    Formula::WallSurfaceFinish,
    Formula::AverageEndArea,
    Formula::Prismoidal,
    Formula::RectangularPit,
    Formula::SlopedTrench,
    Formula::Embankment,
    Formula::SlopeCorrection,
    Formula::ConcreteVolume,
    Formula::FormworkContactArea,
    Formula::RebarWeight,
];

impl Formula {
    pub fn metadata(&self) -> FormulaMetadata {
        use FormulaCategory::*;
        let (name, description, formula_plain, reference, category) = match self {
            Formula::GridRectangle => (
                "Grid Rectangle Area and Perimeter",
                "Space bounded by two grid lines on each axis",
                "A = w × l, P = 2 × (w + l)",
                "Plane geometry",
                Geometry,
            ),
            Formula::ShoelaceArea => (
                "Shoelace Polygon Area",
                "Area of a simple polygon from its ordered vertices",
                "A = |Σ (x_i × y_(i+1) − x_(i+1) × y_i)| / 2",
                "Gauss area formula",
                Geometry,
            ),
            Formula::PolygonPerimeter => (
                "Polygon Perimeter",
                "Sum of edge lengths over the closed ring",
                "P = Σ √((x_(i+1) − x_i)² + (y_(i+1) − y_i)²)",
                "Plane geometry",
                Geometry,
            ),
            Formula::OpeningArea => (
                "Opening Area",
                "Area of punched openings of one size",
                "A = w × h × n",
                "Plane geometry",
                Geometry,
            ),
            Formula::WallGrossArea => (
                "Wall Gross Area",
                "Wall face area from grid span and storey height",
                "A = L × H, A_total = A × S",
                "Plane geometry",
                Geometry,
            ),
            Formula::FloorFinish => (
                "Floor Finish Quantity",
                "Floor area with waste allowance",
                "Q = A × (1 + waste)",
                "Standard quantity takeoff practice",
                Finishes,
            ),
            Formula::CeilingFinish => (
                "Ceiling Finish Quantity",
                "Ceiling area with waste allowance; zero over voids open to below",
                "Q = A × (1 + waste)",
                "Standard quantity takeoff practice",
                Finishes,
            ),
            Formula::PerimeterWallFinish => (
                "Wall Finish Quantity (Space Perimeter)",
                "Perimeter-based wall area less qualifying openings, with waste",
                "Q = max(0, P × H − D) × (1 + waste)",
                "Standard quantity takeoff practice",
                Finishes,
            ),
            Formula::WallSurfaceFinish => (
                "Wall Finish Quantity (Wall Surface)",
                "Modeled wall surface area less qualifying openings, with waste",
                "Q = max(0, L × H × S − D) × (1 + waste)",
                "Standard quantity takeoff practice",
                Finishes,
            ),
            Formula::AverageEndArea => (
                "Average End Area Method",
                "Earthwork volume between consecutive cross-sections",
                "V = Σ ((A1 + A2) / 2) × L",
                "DPWH Standard Specifications, Item 102/104 measurement",
                Earthwork,
            ),
            Formula::Prismoidal => (
                "Prismoidal Formula",
                "Simpson's rule over groups of three stations",
                "V = (L / 6) × (A1 + 4 × Am + A2)",
                "Route surveying practice",
                Earthwork,
            ),
            Formula::RectangularPit => (
                "Rectangular Excavation",
                "Vertical-sided pit",
                "V = L × W × D",
                "Solid geometry",
                Earthwork,
            ),
            Formula::SlopedTrench => (
                "Trench Excavation",
                "Trench with optional side slopes (horizontal : vertical)",
                "Wt = Wb + 2 × D × s, V = L × ((Wt + Wb) / 2) × D",
                "Solid geometry",
                Earthwork,
            ),
            Formula::Embankment => (
                "Embankment Volume",
                "Average end area volume adjusted for compaction",
                "V = V_avg × c",
                "DPWH Standard Specifications, Item 104 measurement",
                Earthwork,
            ),
            Formula::SlopeCorrection => (
                "Slope Correction Factor",
                "Multiplier for quantities measured on sloping terrain",
                "k = 1 / cos θ",
                "Trigonometry",
                Earthwork,
            ),
            Formula::ConcreteVolume => (
                "Concrete Volume",
                "Gross volume of a cast-in-place element",
                "V = b × d × L",
                "DPWH Standard Specifications, Item 900 measurement",
                Structural,
            ),
            Formula::FormworkContactArea => (
                "Formwork Contact Area",
                "Form surface in contact with concrete",
                "beam: (2d + b) × L, column: 2(b + d) × H, slab: A, footing: 2(l + w) × d",
                "DPWH Standard Specifications, Item 903 measurement",
                Structural,
            ),
            Formula::RebarWeight => (
                "Reinforcing Steel Weight",
                "Bar length times unit mass",
                "W = Σ n × L × d² / 162",
                "Unit mass of steel bars, 7850 kg/m³",
                Structural,
            ),
        };
        FormulaMetadata {
            name,
            description,
            formula_plain,
            reference,
            category,
        }
    }
}

/// Render the registry as markdown, grouped by category.
pub fn generate_formulas_markdown() -> String {
    let mut out = String::from("# Takeoff Formula Reference\n");
    let mut categories: Vec<FormulaCategory> = ALL_FORMULAS.iter().map(|f| f.metadata().category).collect();
    categories.dedup();

    for category in categories {
        out.push_str(&format!("\n## {}\n", category.display_name()));
        for formula in ALL_FORMULAS.iter().filter(|f| f.metadata().category == category) {
            let meta = formula.metadata();
            out.push_str(&format!(
                "\n### {}\n\n{}\n\n```text\n{}\n```\n\nReference: {}\n",
                meta.name, meta.description, meta.formula_plain, meta.reference
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_formula_has_metadata() {
        for formula in ALL_FORMULAS {
            let meta = formula.metadata();
            assert!(!meta.name.is_empty());
            assert!(!meta.formula_plain.is_empty());
        }
    }

    #[test]
    fn test_markdown_groups_by_category() {
        let md = generate_formulas_markdown();
        assert!(md.contains("## Geometry"));
        assert!(md.contains("## Earthwork"));
        assert!(md.contains("### Prismoidal Formula"));
        assert!(md.find("## Geometry").unwrap() < md.find("## Finishes").unwrap());
    }
}
