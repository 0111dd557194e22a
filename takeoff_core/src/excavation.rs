//! # Excavation Volume Calculator
//!
//! Earthwork volumes from cross-section stations along an alignment, or from
//! closed-form pit and trench shapes. Every function returns the unadjusted
//! volume together with a `formula_text` that substitutes the literal
//! inputs; the text is part of the audit trail, not logging.
//!
//! ## Station methods
//!
//! ```text
//!   area
//!    │   A1        A2        A3
//!    │   ┃         ┃         ┃
//!    └───┸─────────┸─────────┸──── chainage
//!        0         10        20
//!
//!   average end area:  V = Σ ((A_i + A_(i+1)) / 2) × L_i
//!   prismoidal:        V = (L / 6) × (A1 + 4 × Am + A2)   per group of 3
//! ```
//!
//! Stations may arrive in any order; they are sorted by chainage first.
//!
//! The prismoidal method walks the stations in overlapping groups of three
//! with stride 2 (stations 0-1-2, 2-3-4, ...). With an even number of
//! stations one trailing segment is left over and is measured with the
//! average end area formula.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::finishes::validate_waste;
use crate::formulas::Formula;
use crate::takeoff::{Assumption, LineBuilder, TakeoffLine, Trade};
use crate::units::{format_fixed, format_input, round_to, Unit};

/// Decimal places of volumes shown in formula text and of excavation line quantities
pub const VOLUME_DECIMALS: u32 = 3;

/// A cross-section sample along an alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcavationStation {
    /// Station label, e.g. "0+020"
    pub station: String,
    /// Distance along the alignment (m)
    pub chainage: f64,
    /// Cross-section area (m²)
    pub area: f64,
}

impl ExcavationStation {
    pub fn new(station: impl Into<String>, chainage: f64, area: f64) -> Self {
        ExcavationStation {
            station: station.into(),
            chainage,
            area,
        }
    }
}

/// How one segment's volume was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentMethod {
    AverageEndArea,
    Prismoidal,
}

/// Volume between two (or, for prismoidal groups, three) stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentVolume {
    pub from_station: String,
    pub to_station: String,
    pub distance_m: f64,
    pub volume_m3: f64,
    pub method: SegmentMethod,
}

/// Result of a station-based volume method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationVolume {
    pub volume_m3: f64,
    pub segments: Vec<SegmentVolume>,
    pub formula_text: String,
}

/// Result of a rectangular pit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangularVolume {
    pub volume_m3: f64,
    pub volume_with_waste_m3: f64,
    pub formula_text: String,
}

/// Result of a trench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrenchVolume {
    pub top_width_m: f64,
    pub avg_width_m: f64,
    pub volume_m3: f64,
    pub volume_with_waste_m3: f64,
    pub formula_text: String,
}

/// Result of an embankment (fill) computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbankmentVolume {
    /// Average end area volume before compaction
    pub loose_volume_m3: f64,
    pub compaction_factor: f64,
    pub volume_m3: f64,
    pub segments: Vec<SegmentVolume>,
    pub formula_text: String,
}

fn num(value: f64) -> String {
    format_input(round_to(value, 6))
}

/// Validate stations and return them sorted by chainage.
pub fn sort_stations(stations: &[ExcavationStation]) -> CalcResult<Vec<ExcavationStation>> {
    for s in stations {
        if !s.chainage.is_finite() {
            return Err(CalcError::invalid_dimension(
                format!("chainage ({})", s.station),
                s.chainage,
                "Chainage must be a finite number",
            ));
        }
        if !(s.area >= 0.0) || !s.area.is_finite() {
            return Err(CalcError::invalid_dimension(
                format!("area ({})", s.station),
                s.area,
                "Cross-section area cannot be negative",
            ));
        }
    }
    let mut sorted = stations.to_vec();
    sorted.sort_by(|a, b| a.chainage.total_cmp(&b.chainage));
    Ok(sorted)
}

fn average_segment(a: &ExcavationStation, b: &ExcavationStation) -> (SegmentVolume, String) {
    let distance = b.chainage - a.chainage;
    let volume = (a.area + b.area) / 2.0 * distance;
    (
        SegmentVolume {
            from_station: a.station.clone(),
            to_station: b.station.clone(),
            distance_m: distance,
            volume_m3: volume,
            method: SegmentMethod::AverageEndArea,
        },
        format!("(({} + {}) / 2 × {})", num(a.area), num(b.area), num(distance)),
    )
}

fn prismoidal_segment(
    a: &ExcavationStation,
    mid: &ExcavationStation,
    b: &ExcavationStation,
) -> (SegmentVolume, String) {
    let distance = b.chainage - a.chainage;
    let volume = distance / 6.0 * (a.area + 4.0 * mid.area + b.area);
    (
        SegmentVolume {
            from_station: a.station.clone(),
            to_station: b.station.clone(),
            distance_m: distance,
            volume_m3: volume,
            method: SegmentMethod::Prismoidal,
        },
        format!(
            "({} / 6 × ({} + 4 × {} + {}))",
            num(distance),
            num(a.area),
            num(mid.area),
            num(b.area)
        ),
    )
}

fn station_volume(symbolic: &str, parts: Vec<(SegmentVolume, String)>) -> StationVolume {
    let volume: f64 = parts.iter().map(|(seg, _)| seg.volume_m3).sum();
    let numeric: Vec<String> = parts.iter().map(|(_, text)| text.clone()).collect();
    StationVolume {
        volume_m3: volume,
        formula_text: format!(
            "V = {} = {} = {} m³",
            symbolic,
            numeric.join(" + "),
            format_fixed(volume, VOLUME_DECIMALS)
        ),
        segments: parts.into_iter().map(|(seg, _)| seg).collect(),
    }
}

/// Average end area method. Requires at least 2 stations.
///
/// ```rust
/// use takeoff_core::excavation::{average_area_volume, ExcavationStation};
///
/// let stations = vec![
///     ExcavationStation::new("0+020", 20.0, 6.0),
///     ExcavationStation::new("0+000", 0.0, 5.0),
///     ExcavationStation::new("0+010", 10.0, 7.0),
/// ];
/// let result = average_area_volume(&stations).unwrap();
/// assert_eq!(result.volume_m3, 125.0);
/// ```
pub fn average_area_volume(stations: &[ExcavationStation]) -> CalcResult<StationVolume> {
    if stations.len() < 2 {
        return Err(CalcError::insufficient_stations("average end area", 2, stations.len()));
    }
    let sorted = sort_stations(stations)?;
    let parts = sorted.windows(2).map(|w| average_segment(&w[0], &w[1])).collect();
    Ok(station_volume("Σ ((A1 + A2) / 2 × L)", parts))
}

/// Prismoidal (Simpson's) method. Requires at least 3 stations.
pub fn prismoidal_volume(stations: &[ExcavationStation]) -> CalcResult<StationVolume> {
    if stations.len() < 3 {
        return Err(CalcError::insufficient_stations("prismoidal", 3, stations.len()));
    }
    let sorted = sort_stations(stations)?;

    let mut parts = Vec::new();
    let mut i = 0;
    while i + 2 < sorted.len() {
        parts.push(prismoidal_segment(&sorted[i], &sorted[i + 1], &sorted[i + 2]));
        i += 2;
    }
    if i + 1 < sorted.len() {
        parts.push(average_segment(&sorted[i], &sorted[i + 1]));
    }

    let symbolic = if parts.iter().any(|(seg, _)| seg.method == SegmentMethod::AverageEndArea) {
        "Σ (L / 6 × (A1 + 4 × Am + A2)) + (A1 + A2) / 2 × L"
    } else {
        "Σ (L / 6 × (A1 + 4 × Am + A2))"
    };
    Ok(station_volume(symbolic, parts))
}

fn require_positive(field: &str, value: f64) -> CalcResult<()> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(CalcError::invalid_dimension(field, value, "Must be greater than zero"));
    }
    Ok(())
}

fn waste_text(volume: f64, waste: f64) -> String {
    if waste > 0.0 {
        format!(
            "; V_w = V × (1 + waste) = {} × (1 + {}) = {} m³",
            num(volume),
            format_input(waste),
            format_fixed(volume * (1.0 + waste), VOLUME_DECIMALS)
        )
    } else {
        String::new()
    }
}

/// Vertical-sided pit: `V = L × W × D`.
pub fn rectangular_excavation(length_m: f64, width_m: f64, depth_m: f64, waste: f64) -> CalcResult<RectangularVolume> {
    require_positive("length_m", length_m)?;
    require_positive("width_m", width_m)?;
    require_positive("depth_m", depth_m)?;
    validate_waste("waste", waste)?;

    let volume = length_m * width_m * depth_m;
    Ok(RectangularVolume {
        volume_m3: volume,
        volume_with_waste_m3: volume * (1.0 + waste),
        formula_text: format!(
            "V = L × W × D = {} × {} × {} = {} m³{}",
            num(length_m),
            num(width_m),
            num(depth_m),
            format_fixed(volume, VOLUME_DECIMALS),
            waste_text(volume, waste)
        ),
    })
}

/// Trench with side slopes (horizontal run per unit depth, 0 = vertical sides).
pub fn trench_excavation(
    length_m: f64,
    bottom_width_m: f64,
    depth_m: f64,
    side_slope: f64,
    waste: f64,
) -> CalcResult<TrenchVolume> {
    require_positive("length_m", length_m)?;
    require_positive("bottom_width_m", bottom_width_m)?;
    require_positive("depth_m", depth_m)?;
    if !(side_slope >= 0.0) || !side_slope.is_finite() {
        return Err(CalcError::invalid_dimension("side_slope", side_slope, "Side slope cannot be negative"));
    }
    validate_waste("waste", waste)?;

    if side_slope == 0.0 {
        let volume = length_m * bottom_width_m * depth_m;
        return Ok(TrenchVolume {
            top_width_m: bottom_width_m,
            avg_width_m: bottom_width_m,
            volume_m3: volume,
            volume_with_waste_m3: volume * (1.0 + waste),
            formula_text: format!(
                "V = L × Wb × D = {} × {} × {} = {} m³{}",
                num(length_m),
                num(bottom_width_m),
                num(depth_m),
                format_fixed(volume, VOLUME_DECIMALS),
                waste_text(volume, waste)
            ),
        });
    }

    let top_width = bottom_width_m + 2.0 * depth_m * side_slope;
    let avg_width = (top_width + bottom_width_m) / 2.0;
    let volume = length_m * avg_width * depth_m;
    Ok(TrenchVolume {
        top_width_m: top_width,
        avg_width_m: avg_width,
        volume_m3: volume,
        volume_with_waste_m3: volume * (1.0 + waste),
        formula_text: format!(
            "Wt = Wb + 2 × D × s = {} + 2 × {} × {} = {} m; V = L × ((Wt + Wb) / 2) × D = {} × (({} + {}) / 2) × {} = {} m³{}",
            num(bottom_width_m),
            num(depth_m),
            num(side_slope),
            format_fixed(top_width, VOLUME_DECIMALS),
            num(length_m),
            num(top_width),
            num(bottom_width_m),
            num(depth_m),
            format_fixed(volume, VOLUME_DECIMALS),
            waste_text(volume, waste)
        ),
    })
}

/// Fill volume: average end area times a compaction factor (default 1.0).
pub fn embankment_volume(stations: &[ExcavationStation], compaction_factor: Option<f64>) -> CalcResult<EmbankmentVolume> {
    let factor = compaction_factor.unwrap_or(1.0);
    require_positive("compaction_factor", factor)?;

    let loose = average_area_volume(stations)?;
    let volume = loose.volume_m3 * factor;
    Ok(EmbankmentVolume {
        loose_volume_m3: loose.volume_m3,
        compaction_factor: factor,
        volume_m3: volume,
        formula_text: format!(
            "{}; V_fill = V × c = {} × {} = {} m³",
            loose.formula_text,
            num(loose.volume_m3),
            format_input(factor),
            format_fixed(volume, VOLUME_DECIMALS)
        ),
        segments: loose.segments,
    })
}

/// `1 / cos(θ)` for terrain slope corrections. |θ| must be below 90°.
pub fn slope_correction_factor(angle_radians: f64) -> CalcResult<f64> {
    if !angle_radians.is_finite() || angle_radians.abs() >= std::f64::consts::FRAC_PI_2 {
        return Err(CalcError::invalid_dimension(
            "angle_radians",
            angle_radians,
            "Slope angle must be between -π/2 and π/2",
        ));
    }
    Ok(1.0 / angle_radians.cos())
}

// ============================================================================
// Excavation items in a calc run
// ============================================================================

/// How an excavation item is measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum ExcavationMethod {
    AverageArea {
        stations: Vec<ExcavationStation>,
    },
    Prismoidal {
        stations: Vec<ExcavationStation>,
    },
    Rectangular {
        length_m: f64,
        width_m: f64,
        depth_m: f64,
        #[serde(default)]
        waste: f64,
    },
    Trench {
        length_m: f64,
        bottom_width_m: f64,
        depth_m: f64,
        #[serde(default)]
        side_slope: f64,
        #[serde(default)]
        waste: f64,
    },
    Embankment {
        stations: Vec<ExcavationStation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compaction_factor: Option<f64>,
    },
}

impl ExcavationMethod {
    /// DPWH item used when the item does not name one
    pub fn default_item_number(&self) -> &'static str {
        match self {
            ExcavationMethod::AverageArea { .. } | ExcavationMethod::Prismoidal { .. } => "102 (1)",
            ExcavationMethod::Rectangular { .. } | ExcavationMethod::Trench { .. } => "103 (1)",
            ExcavationMethod::Embankment { .. } => "104 (1)",
        }
    }

    pub fn stations(&self) -> &[ExcavationStation] {
        match self {
            ExcavationMethod::AverageArea { stations }
            | ExcavationMethod::Prismoidal { stations }
            | ExcavationMethod::Embankment { stations, .. } => stations,
            _ => &[],
        }
    }
}

/// One earthwork quantity in a project snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcavationItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpwh_item_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
    pub method: ExcavationMethod,
}

/// Produce the earthwork takeoff line for one excavation item.
pub fn excavation_takeoff(item: &ExcavationItem) -> CalcResult<TakeoffLine> {
    let item_number = item
        .dpwh_item_number
        .clone()
        .unwrap_or_else(|| item.method.default_item_number().to_string());

    let base = |formula: Formula, key: &str| {
        let mut builder = LineBuilder::new(
            &item.id,
            Trade::Earthwork,
            format!("earthwork:{}", key),
            Unit::CubicMeter,
            formula,
        )
        .tag("earthwork")
        .dpwh_item(Some(item_number.clone()));
        if let Some(level) = &item.level_id {
            builder = builder.level(level.clone());
        }
        builder
    };

    let line = match &item.method {
        ExcavationMethod::AverageArea { stations } => {
            let result = average_area_volume(stations)?;
            base(Formula::AverageEndArea, "cut")
                .input("station_count", stations.len() as f64)
                .input("volume_m3", result.volume_m3)
                .formula_text(result.formula_text)
                .build(round_to(result.volume_m3, VOLUME_DECIMALS))
        }
        ExcavationMethod::Prismoidal { stations } => {
            let result = prismoidal_volume(stations)?;
            let fallback = result
                .segments
                .iter()
                .any(|s| s.method == SegmentMethod::AverageEndArea);
            base(Formula::Prismoidal, "cut")
                .input("station_count", stations.len() as f64)
                .input("volume_m3", result.volume_m3)
                .assume_if(
                    fallback,
                    Assumption::Note {
                        text: "Trailing segment measured by average end area".to_string(),
                    },
                )
                .formula_text(result.formula_text)
                .build(round_to(result.volume_m3, VOLUME_DECIMALS))
        }
        ExcavationMethod::Rectangular {
            length_m,
            width_m,
            depth_m,
            waste,
        } => {
            let result = rectangular_excavation(*length_m, *width_m, *depth_m, *waste)?;
            base(Formula::RectangularPit, "structure")
                .input("length_m", *length_m)
                .input("width_m", *width_m)
                .input("depth_m", *depth_m)
                .input("waste_percent", *waste)
                .input("volume_m3", result.volume_m3)
                .assume_if(*waste > 0.0, Assumption::Waste { percent: *waste })
                .formula_text(result.formula_text)
                .build(round_to(result.volume_with_waste_m3, VOLUME_DECIMALS))
        }
        ExcavationMethod::Trench {
            length_m,
            bottom_width_m,
            depth_m,
            side_slope,
            waste,
        } => {
            let result = trench_excavation(*length_m, *bottom_width_m, *depth_m, *side_slope, *waste)?;
            base(Formula::SlopedTrench, "structure")
                .input("length_m", *length_m)
                .input("bottom_width_m", *bottom_width_m)
                .input("depth_m", *depth_m)
                .input("side_slope", *side_slope)
                .input("top_width_m", result.top_width_m)
                .input("waste_percent", *waste)
                .input("volume_m3", result.volume_m3)
                .assume_if(*waste > 0.0, Assumption::Waste { percent: *waste })
                .formula_text(result.formula_text)
                .build(round_to(result.volume_with_waste_m3, VOLUME_DECIMALS))
        }
        ExcavationMethod::Embankment {
            stations,
            compaction_factor,
        } => {
            let result = embankment_volume(stations, *compaction_factor)?;
            base(Formula::Embankment, "fill")
                .input("station_count", stations.len() as f64)
                .input("loose_volume_m3", result.loose_volume_m3)
                .input("compaction_factor", result.compaction_factor)
                .assume(Assumption::Compaction {
                    factor: result.compaction_factor,
                })
                .formula_text(result.formula_text)
                .build(round_to(result.volume_m3, VOLUME_DECIMALS))
        }
    };
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations(data: &[(f64, f64)]) -> Vec<ExcavationStation> {
        data.iter()
            .map(|(ch, area)| ExcavationStation::new(format!("0+{:03}", *ch as u32), *ch, *area))
            .collect()
    }

    #[test]
    fn test_average_area_three_stations() {
        let result = average_area_volume(&stations(&[(0.0, 5.0), (10.0, 7.0), (20.0, 6.0)])).unwrap();
        assert_eq!(result.volume_m3, 125.0);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].volume_m3, 60.0);
        assert_eq!(result.segments[1].volume_m3, 65.0);
        assert_eq!(
            result.formula_text,
            "V = Σ ((A1 + A2) / 2 × L) = ((5 + 7) / 2 × 10) + ((7 + 6) / 2 × 10) = 125.000 m³"
        );
    }

    #[test]
    fn test_average_area_sorts_by_chainage() {
        let shuffled = stations(&[(20.0, 6.0), (0.0, 5.0), (10.0, 7.0)]);
        let result = average_area_volume(&shuffled).unwrap();
        assert_eq!(result.volume_m3, 125.0);
        assert_eq!(result.segments[0].from_station, "0+000");
    }

    #[test]
    fn test_average_area_insufficient() {
        let result = average_area_volume(&stations(&[(0.0, 5.0)]));
        assert_eq!(
            result,
            Err(CalcError::InsufficientStations { method: "average end area".into(), required: 2, found: 1 })
        );
    }

    #[test]
    fn test_negative_station_area_rejected() {
        let result = average_area_volume(&stations(&[(0.0, 5.0), (10.0, -1.0)]));
        assert!(matches!(result, Err(CalcError::InvalidDimension { .. })));
    }

    #[test]
    fn test_prismoidal_three_stations() {
        let result = prismoidal_volume(&stations(&[(0.0, 5.0), (10.0, 7.0), (20.0, 6.0)])).unwrap();
        // 20/6 × (5 + 28 + 6) = 130
        assert!((result.volume_m3 - 130.0).abs() < 1e-9);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].method, SegmentMethod::Prismoidal);
    }

    #[test]
    fn test_prismoidal_five_stations_two_groups() {
        let result = prismoidal_volume(&stations(&[(0.0, 5.0), (10.0, 7.0), (20.0, 6.0), (30.0, 8.0), (40.0, 4.0)])).unwrap();
        // 130 + 20/6 × (6 + 32 + 4) = 130 + 140
        assert!((result.volume_m3 - 270.0).abs() < 1e-9);
        assert!(result.segments.iter().all(|s| s.method == SegmentMethod::Prismoidal));
    }

    /// Four stations: one prismoidal group (0-1-2) and the trailing
    /// segment (2-3) measured by average end area.
    #[test]
    fn test_prismoidal_even_station_count_trailing_segment() {
        let result = prismoidal_volume(&stations(&[(0.0, 5.0), (10.0, 7.0), (20.0, 6.0), (30.0, 8.0)])).unwrap();
        // 130 + (6 + 8) / 2 × 10 = 200
        assert!((result.volume_m3 - 200.0).abs() < 1e-9);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[1].method, SegmentMethod::AverageEndArea);
        assert_eq!(result.segments[1].from_station, "0+020");
        assert!(result.formula_text.contains("((6 + 8) / 2 × 10)"));
    }

    #[test]
    fn test_prismoidal_insufficient() {
        let result = prismoidal_volume(&stations(&[(0.0, 5.0), (10.0, 7.0)]));
        assert!(matches!(result, Err(CalcError::InsufficientStations { required: 3, found: 2, .. })));
    }

    #[test]
    fn test_rectangular_excavation() {
        let result = rectangular_excavation(10.0, 5.0, 2.0, 0.1).unwrap();
        assert_eq!(result.volume_m3, 100.0);
        assert!((result.volume_with_waste_m3 - 110.0).abs() < 1e-9);
        assert_eq!(
            result.formula_text,
            "V = L × W × D = 10 × 5 × 2 = 100.000 m³; V_w = V × (1 + waste) = 100 × (1 + 0.1) = 110.000 m³"
        );
    }

    #[test]
    fn test_rectangular_validation() {
        assert!(matches!(rectangular_excavation(0.0, 5.0, 2.0, 0.0), Err(CalcError::InvalidDimension { .. })));
        assert!(matches!(rectangular_excavation(1.0, 5.0, 2.0, 1.5), Err(CalcError::InvalidDimension { .. })));
        assert!(matches!(rectangular_excavation(1.0, 5.0, -2.0, 0.0), Err(CalcError::InvalidDimension { .. })));
    }

    #[test]
    fn test_trench_vertical_sides() {
        let result = trench_excavation(20.0, 0.6, 1.5, 0.0, 0.0).unwrap();
        assert!((result.volume_m3 - 18.0).abs() < 1e-9);
        assert_eq!(result.top_width_m, 0.6);
        assert!(result.formula_text.starts_with("V = L × Wb × D = 20 × 0.6 × 1.5"));
    }

    #[test]
    fn test_trench_sloped_sides() {
        let result = trench_excavation(20.0, 0.6, 1.5, 0.5, 0.0).unwrap();
        // Wt = 0.6 + 2 × 1.5 × 0.5 = 2.1, avg = 1.35, V = 20 × 1.35 × 1.5 = 40.5
        assert!((result.top_width_m - 2.1).abs() < 1e-9);
        assert!((result.avg_width_m - 1.35).abs() < 1e-9);
        assert!((result.volume_m3 - 40.5).abs() < 1e-9);
        assert!(result.formula_text.ends_with("= 40.500 m³"));
    }

    #[test]
    fn test_trench_negative_slope_rejected() {
        assert!(matches!(trench_excavation(20.0, 0.6, 1.5, -0.5, 0.0), Err(CalcError::InvalidDimension { .. })));
    }

    #[test]
    fn test_embankment_compaction() {
        let data = stations(&[(0.0, 5.0), (10.0, 7.0), (20.0, 6.0)]);
        let loose = embankment_volume(&data, None).unwrap();
        assert_eq!(loose.volume_m3, 125.0);
        assert_eq!(loose.compaction_factor, 1.0);

        let compacted = embankment_volume(&data, Some(1.2)).unwrap();
        assert!((compacted.volume_m3 - 150.0).abs() < 1e-9);
        assert!(compacted.formula_text.ends_with("V_fill = V × c = 125 × 1.2 = 150.000 m³"));

        assert!(matches!(embankment_volume(&data, Some(0.0)), Err(CalcError::InvalidDimension { .. })));
    }

    #[test]
    fn test_slope_correction_factor() {
        assert_eq!(slope_correction_factor(0.0).unwrap(), 1.0);
        let k = slope_correction_factor(std::f64::consts::FRAC_PI_3).unwrap();
        assert!((k - 2.0).abs() < 1e-9);
        assert!(slope_correction_factor(std::f64::consts::FRAC_PI_2).is_err());
    }

    #[test]
    fn test_excavation_item_json_and_takeoff() {
        let item: ExcavationItem = serde_json::from_str(
            r#"{
                "id": "EX-1",
                "name": "Footing pit F1",
                "method": { "method": "rectangular", "length_m": 2.0, "width_m": 2.0, "depth_m": 1.5, "waste": 0.1 }
            }"#,
        )
        .unwrap();
        let line = excavation_takeoff(&item).unwrap();
        assert_eq!(line.trade, Trade::Earthwork);
        assert_eq!(line.dpwh_item_number.as_deref(), Some("103 (1)"));
        assert!((line.quantity - 6.6).abs() < 1e-9);
        assert_eq!(line.assumption_texts(), vec!["Waste allowance: 10%"]);
    }

    #[test]
    fn test_prismoidal_item_notes_fallback() {
        let item = ExcavationItem {
            id: "EX-2".into(),
            name: "Road cut".into(),
            dpwh_item_number: Some("102 (2)".into()),
            level_id: None,
            method: ExcavationMethod::Prismoidal {
                stations: stations(&[(0.0, 5.0), (10.0, 7.0), (20.0, 6.0), (30.0, 8.0)]),
            },
        };
        let line = excavation_takeoff(&item).unwrap();
        assert_eq!(line.quantity, 200.0);
        assert_eq!(line.dpwh_item_number.as_deref(), Some("102 (2)"));
        assert_eq!(line.assumption_texts(), vec!["Trailing segment measured by average end area"]);
    }
}
