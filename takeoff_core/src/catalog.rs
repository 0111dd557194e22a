//! # Pay-Item Catalog
//!
//! Lookup from a DPWH pay-item number to its description, unit and trade.
//! The engine only reads from a catalog; owning and editing one is up to the
//! caller. [`InMemoryCatalog`] is the bundled implementation, and
//! [`InMemoryCatalog::dpwh_defaults`] seeds it with the items the engine
//! emits by default.
//!
//! Item numbers are compared after normalization: surrounding whitespace and
//! an "Item" prefix are dropped and inner whitespace is collapsed, so
//! `"Item 900 (1)  c"` and `"900 (1) c"` are the same key.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::takeoff::Trade;
use crate::units::Unit;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayItem {
    pub item_number: String,
    pub description: String,
    pub unit: Unit,
    pub trade: Trade,
}

impl PayItem {
    pub fn new(item_number: impl Into<String>, description: impl Into<String>, unit: Unit, trade: Trade) -> Self {
        PayItem {
            item_number: item_number.into(),
            description: description.into(),
            unit,
            trade,
        }
    }
}

/// Read-only pay-item lookup.
pub trait PayItemCatalog {
    fn lookup(&self, item_number: &str) -> Option<PayItem>;
}

/// Canonical form of a pay-item number used as a lookup key.
pub fn normalize_item_number(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = match trimmed.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("item") => &trimmed[4..],
        _ => trimmed,
    };
    without_prefix.split_whitespace().collect::<Vec<_>>().join(" ")
}

static DPWH_DEFAULTS: Lazy<Vec<PayItem>> = Lazy::new(|| {
    use Trade::*;
    use Unit::*;
    vec![
        PayItem::new("102 (1)", "Roadway Excavation", CubicMeter, Earthwork),
        PayItem::new("103 (1)", "Structure Excavation, Common Soil", CubicMeter, Earthwork),
        PayItem::new("104 (1)", "Embankment from Roadway Excavation", CubicMeter, Earthwork),
        PayItem::new("900 (1) c", "Structural Concrete, Class A, 28 days", CubicMeter, Concrete),
        PayItem::new("902 (1) a1", "Reinforcing Steel (Deformed), Grade 40", Kilogram, Rebar),
        PayItem::new("902 (1) a2", "Reinforcing Steel (Deformed), Grade 60", Kilogram, Rebar),
        PayItem::new("903 (1)", "Formworks and Falseworks", SquareMeter, Formwork),
        PayItem::new("1018 (1)", "Glazed Tiles and Trims", SquareMeter, Finishes),
        PayItem::new("1027 (1)", "Cement Plaster Finish", SquareMeter, Finishes),
        PayItem::new("1032 (1) a", "Painting Works, Masonry/Concrete", SquareMeter, Finishes),
    ]
});

/// HashMap-backed catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: HashMap<String, PayItem>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the engine's default pay items
    pub fn dpwh_defaults() -> Self {
        Self::from_items(DPWH_DEFAULTS.iter().cloned())
    }

    pub fn from_items(items: impl IntoIterator<Item = PayItem>) -> Self {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, item: PayItem) {
        self.items.insert(normalize_item_number(&item.item_number), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PayItemCatalog for InMemoryCatalog {
    fn lookup(&self, item_number: &str) -> Option<PayItem> {
        self.items.get(&normalize_item_number(item_number)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_item_number() {
        assert_eq!(normalize_item_number("  Item 900 (1)  c "), "900 (1) c");
        assert_eq!(normalize_item_number("ITEM 103 (1)"), "103 (1)");
        assert_eq!(normalize_item_number("1032 (1) a"), "1032 (1) a");
        assert_eq!(normalize_item_number(""), "");
    }

    #[test]
    fn test_default_lookup() {
        let catalog = InMemoryCatalog::dpwh_defaults();
        let item = catalog.lookup("Item 902 (1) a2").unwrap();
        assert_eq!(item.unit, Unit::Kilogram);
        assert_eq!(item.trade, Trade::Rebar);
        assert!(catalog.lookup("999 (9)").is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert(PayItem::new("1018 (1)", "Floor tiles", Unit::SquareMeter, Trade::Finishes));
        catalog.insert(PayItem::new("1018  (1)", "Glazed tiles", Unit::SquareMeter, Trade::Finishes));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("1018 (1)").unwrap().description, "Glazed tiles");
    }
}
