//! # DPWH Classification and Aggregation
//!
//! Maps pay-item numbers to DPWH Parts and subcategories, orders Parts
//! canonically, and groups takeoff lines into a bill of quantities.
//!
//! ## Part ranges
//!
//! | Item number          | Part    | Title                                   |
//! |----------------------|---------|-----------------------------------------|
//! | `A.x`                | PART A  | Facilities for the Engineer             |
//! | `B.x`                | PART B  | Other General Requirements              |
//! | 100–199, 800–899     | PART C  | Earthwork                               |
//! | 200–299              | PART D  | Subbase and Base Course                 |
//! | 300–399              | PART E  | Surface Courses                         |
//! | 400–499              | PART F  | Bridge Construction                     |
//! | 500–599              | PART G  | Drainage and Slope Protection Structures|
//! | 600–699              | PART H  | Miscellaneous Structures                |
//! | 700–799              | PART I  | Materials Details                       |
//! | 900–999              | PART J  | Concrete, Steel and Formworks           |
//! | 1000–1099            | PART K  | Architectural Finishes                  |
//!
//! Lines without a parseable item number are classified by trade. Numbers
//! outside every range land in `Unclassified`, which sorts last.
//!
//! Aggregation is a read-only transform over lines that already exist; it
//! never recomputes geometry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{normalize_item_number, PayItemCatalog};
use crate::takeoff::{TakeoffLine, Trade};
use crate::units::{round_to, Unit};

/// DPWH Part, in canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DpwhPart {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    Unclassified,
}

pub const ALL_PARTS: &[DpwhPart] = &[
    DpwhPart::A,
    DpwhPart::B,
    DpwhPart::C,
    DpwhPart::D,
    DpwhPart::E,
    DpwhPart::F,
    DpwhPart::G,
    DpwhPart::H,
    DpwhPart::I,
    DpwhPart::J,
    DpwhPart::K,
    DpwhPart::Unclassified,
];

impl DpwhPart {
    /// Report label, e.g. "PART C"
    pub fn label(&self) -> &'static str {
        match self {
            DpwhPart::A => "PART A",
            DpwhPart::B => "PART B",
            DpwhPart::C => "PART C",
            DpwhPart::D => "PART D",
            DpwhPart::E => "PART E",
            DpwhPart::F => "PART F",
            DpwhPart::G => "PART G",
            DpwhPart::H => "PART H",
            DpwhPart::I => "PART I",
            DpwhPart::J => "PART J",
            DpwhPart::K => "PART K",
            DpwhPart::Unclassified => "Unclassified",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DpwhPart::A => "Facilities for the Engineer",
            DpwhPart::B => "Other General Requirements",
            DpwhPart::C => "Earthwork",
            DpwhPart::D => "Subbase and Base Course",
            DpwhPart::E => "Surface Courses",
            DpwhPart::F => "Bridge Construction",
            DpwhPart::G => "Drainage and Slope Protection Structures",
            DpwhPart::H => "Miscellaneous Structures",
            DpwhPart::I => "Materials Details",
            DpwhPart::J => "Concrete, Steel and Formworks",
            DpwhPart::K => "Architectural Finishes",
            DpwhPart::Unclassified => "Unclassified",
        }
    }

    /// Parse a label such as "PART C" or "part c".
    pub fn from_label(label: &str) -> Option<DpwhPart> {
        let label = label.trim();
        ALL_PARTS.iter().copied().find(|p| p.label().eq_ignore_ascii_case(label))
    }

    fn for_trade(trade: Trade) -> DpwhPart {
        match trade {
            Trade::Earthwork => DpwhPart::C,
            Trade::Concrete | Trade::Rebar | Trade::Formwork => DpwhPart::J,
            Trade::Finishes => DpwhPart::K,
        }
    }

    fn for_number(number: u32) -> DpwhPart {
        match number {
            100..=199 | 800..=899 => DpwhPart::C,
            200..=299 => DpwhPart::D,
            300..=399 => DpwhPart::E,
            400..=499 => DpwhPart::F,
            500..=599 => DpwhPart::G,
            600..=699 => DpwhPart::H,
            700..=799 => DpwhPart::I,
            900..=999 => DpwhPart::J,
            1000..=1099 => DpwhPart::K,
            _ => DpwhPart::Unclassified,
        }
    }
}

impl std::fmt::Display for DpwhPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Part and subcategory of one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub part: DpwhPart,
    pub subcategory: String,
}

/// Leading integer of a pay-item number ("Item 902 (1) a2" -> 902).
pub fn parse_item_number(raw: &str) -> Option<u32> {
    let normalized = normalize_item_number(raw);
    let digits: String = normalized.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn letter_part(normalized: &str) -> Option<DpwhPart> {
    let mut chars = normalized.chars();
    let letter = chars.next()?;
    match chars.next() {
        Some('.') | Some(' ') => {}
        _ => return None,
    }
    match letter.to_ascii_uppercase() {
        'A' => Some(DpwhPart::A),
        'B' => Some(DpwhPart::B),
        _ => None,
    }
}

fn subcategory_for(number: u32) -> Option<&'static str> {
    match number {
        102 => Some("Excavation"),
        103 => Some("Structure Excavation"),
        104 => Some("Embankment"),
        900 => Some("Structural Concrete"),
        902 => Some("Reinforcing Steel"),
        903 => Some("Formworks and Falseworks"),
        1018 => Some("Tile Works"),
        1027 => Some("Cement Plaster Finish"),
        1032 => Some("Painting"),
        _ => None,
    }
}

/// Classify a line by pay-item number, falling back to its trade.
///
/// ```rust
/// use takeoff_core::classification::{classify, DpwhPart};
/// use takeoff_core::takeoff::Trade;
///
/// let c = classify(Some("902 (1) a2"), Trade::Rebar);
/// assert_eq!(c.part, DpwhPart::J);
/// assert_eq!(c.subcategory, "Reinforcing Steel");
///
/// let c = classify(None, Trade::Finishes);
/// assert_eq!(c.part, DpwhPart::K);
/// assert_eq!(c.subcategory, "Finishes");
/// ```
pub fn classify(item_number: Option<&str>, trade: Trade) -> Classification {
    let by_trade = || Classification {
        part: DpwhPart::for_trade(trade),
        subcategory: trade.display_name().to_string(),
    };

    let Some(raw) = item_number else {
        return by_trade();
    };
    let normalized = normalize_item_number(raw);

    if let Some(part) = letter_part(&normalized) {
        return Classification {
            part,
            subcategory: trade.display_name().to_string(),
        };
    }

    match parse_item_number(&normalized) {
        Some(number) => Classification {
            part: DpwhPart::for_number(number),
            subcategory: subcategory_for(number)
                .map(str::to_string)
                .unwrap_or_else(|| trade.display_name().to_string()),
        },
        None => by_trade(),
    }
}

fn part_sort_key(label: &str) -> (usize, String) {
    match DpwhPart::from_label(label) {
        Some(part) => (part as usize, String::new()),
        None => (ALL_PARTS.len(), label.to_string()),
    }
}

/// Sort Part labels canonically: PART A..PART K, then Unclassified, then
/// unknown labels alphabetically.
pub fn sort_dpwh_parts<S: AsRef<str>>(parts: &mut [S]) {
    parts.sort_by_cached_key(|p| part_sort_key(p.as_ref()));
}

/// How lines are presented inside each subcategory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportView {
    /// Every line, unaggregated
    #[default]
    Detailed,
    /// Lines summed per (item number, template, level)
    Summarized,
}

/// Summed quantity of lines sharing item number, template and level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub dpwh_item_number: Option<String>,
    pub template_id: Option<String>,
    pub level_id: Option<String>,
    /// From the catalog when the item is known
    pub description: Option<String>,
    pub unit: Unit,
    pub quantity: f64,
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", content = "items", rename_all = "lowercase")]
pub enum GroupEntries {
    Lines(Vec<TakeoffLine>),
    Rows(Vec<SummaryRow>),
}

impl GroupEntries {
    pub fn len(&self) -> usize {
        match self {
            GroupEntries::Lines(lines) => lines.len(),
            GroupEntries::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryGroup {
    pub name: String,
    pub entries: GroupEntries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartGroup {
    pub part: DpwhPart,
    pub label: String,
    pub title: String,
    pub subcategories: Vec<SubcategoryGroup>,
}

/// Lines grouped by Part then subcategory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqReport {
    pub view: ReportView,
    pub parts: Vec<PartGroup>,
}

type RowKey = (Option<String>, Option<String>, Option<String>, Unit);

fn summarize(lines: Vec<&TakeoffLine>, catalog: &dyn PayItemCatalog) -> Vec<SummaryRow> {
    let mut rows: BTreeMap<RowKey, SummaryRow> = BTreeMap::new();
    for line in lines {
        let key = (
            line.dpwh_item_number.clone(),
            line.template_id.clone(),
            line.level_id.clone(),
            line.unit,
        );
        let row = rows.entry(key).or_insert_with(|| SummaryRow {
            dpwh_item_number: line.dpwh_item_number.clone(),
            template_id: line.template_id.clone(),
            level_id: line.level_id.clone(),
            description: line
                .dpwh_item_number
                .as_deref()
                .and_then(|item| catalog.lookup(item))
                .map(|item| item.description),
            unit: line.unit,
            quantity: 0.0,
            line_count: 0,
        });
        row.quantity += line.quantity;
        row.line_count += 1;
    }
    rows.into_values()
        .map(|mut row| {
            row.quantity = round_to(row.quantity, 6);
            row
        })
        .collect()
}

/// Group `lines` by Part (canonical order) and subcategory (alphabetical).
///
/// Summarized rows never mix units: lines under one key with different
/// units stay in separate rows.
pub fn aggregate(lines: &[TakeoffLine], view: ReportView, catalog: &dyn PayItemCatalog) -> BoqReport {
    let mut grouped: BTreeMap<DpwhPart, BTreeMap<String, Vec<&TakeoffLine>>> = BTreeMap::new();
    for line in lines {
        let c = classify(line.dpwh_item_number.as_deref(), line.trade);
        grouped
            .entry(c.part)
            .or_default()
            .entry(c.subcategory)
            .or_default()
            .push(line);
    }

    let parts = grouped
        .into_iter()
        .map(|(part, subcategories)| PartGroup {
            part,
            label: part.label().to_string(),
            title: part.title().to_string(),
            subcategories: subcategories
                .into_iter()
                .map(|(name, members)| SubcategoryGroup {
                    name,
                    entries: match view {
                        ReportView::Detailed => GroupEntries::Lines(members.into_iter().cloned().collect()),
                        ReportView::Summarized => GroupEntries::Rows(summarize(members, catalog)),
                    },
                })
                .collect(),
        })
        .collect();

    BoqReport { view, parts }
}
