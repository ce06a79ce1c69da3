use serde::{Deserialize, Serialize};

/// Canonical stock vocabulary (spec's closed enum: in_stock, out_of_stock,
/// low_stock, backorder, preorder, unknown). Extraction strategies each
/// produce free-text labels ("In Stock", "Sold Out", "Only 2 left",
/// schema.org `availability` URIs); this collapses them to this small,
/// comparable set via a fixed alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    LowStock,
    Backorder,
    Preorder,
    Unknown,
}

impl StockStatus {
    /// Maps a raw label (as seen on a page, button, or JSON-LD `availability`
    /// field) onto the canonical vocabulary. Unrecognized input is `Unknown`
    /// rather than an error — stock text is never authoritative enough to
    /// fail a check over. Order matters: more specific aliases (backorder,
    /// preorder, low-stock) are checked before the generic in-stock/
    /// out-of-stock buckets so e.g. "Available for Preorder" doesn't match
    /// "available" first.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return StockStatus::Unknown;
        }
        if BACKORDER_ALIASES.iter().any(|alias| normalized.contains(alias)) {
            return StockStatus::Backorder;
        }
        if PREORDER_ALIASES.iter().any(|alias| normalized.contains(alias)) {
            return StockStatus::Preorder;
        }
        if LOW_STOCK_ALIASES.iter().any(|alias| normalized.contains(alias)) {
            return StockStatus::LowStock;
        }
        if OUT_OF_STOCK_ALIASES
            .iter()
            .any(|alias| normalized.contains(alias))
        {
            return StockStatus::OutOfStock;
        }
        if IN_STOCK_ALIASES.iter().any(|alias| normalized.contains(alias)) {
            return StockStatus::InStock;
        }
        StockStatus::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::Backorder => "backorder",
            StockStatus::Preorder => "preorder",
            StockStatus::Unknown => "unknown",
        }
    }

    /// Derives `variants.is_available` per spec: `true` when in stock,
    /// `false` when out of stock, `null` (here `None`) for every other
    /// status — low-stock/backorder/preorder/unknown are all ambiguous
    /// about purchasability, so ingestion must not guess.
    pub fn is_available(self) -> Option<bool> {
        match self {
            StockStatus::InStock => Some(true),
            StockStatus::OutOfStock => Some(false),
            StockStatus::LowStock | StockStatus::Backorder | StockStatus::Preorder | StockStatus::Unknown => None,
        }
    }
}

const IN_STOCK_ALIASES: &[&str] = &[
    "in stock",
    "instock",
    "available",
    "add to cart",
    "add to bag",
    "in_stock",
];

const OUT_OF_STOCK_ALIASES: &[&str] = &[
    "out of stock",
    "outofstock",
    "sold out",
    "unavailable",
    "out_of_stock",
    "discontinued",
];

const LOW_STOCK_ALIASES: &[&str] = &[
    "low stock",
    "only",
    "few left",
    "limited availability",
    "limitedavailability",
    "limited stock",
];

const BACKORDER_ALIASES: &[&str] = &["backorder", "back order", "back-order"];

const PREORDER_ALIASES: &[&str] = &["preorder", "pre order", "pre-order"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_in_stock_labels() {
        assert_eq!(StockStatus::from_label("In Stock"), StockStatus::InStock);
    }

    #[test]
    fn recognizes_schema_org_availability_urls() {
        assert_eq!(
            StockStatus::from_label("https://schema.org/InStock"),
            StockStatus::InStock
        );
    }

    #[test]
    fn recognizes_out_of_stock_labels() {
        assert_eq!(
            StockStatus::from_label("Sold Out"),
            StockStatus::OutOfStock
        );
    }

    #[test]
    fn recognizes_low_stock_labels() {
        assert_eq!(
            StockStatus::from_label("Only 2 left"),
            StockStatus::LowStock
        );
    }

    #[test]
    fn recognizes_backorder_labels() {
        assert_eq!(
            StockStatus::from_label("Available on Backorder"),
            StockStatus::Backorder
        );
    }

    #[test]
    fn recognizes_preorder_labels() {
        assert_eq!(
            StockStatus::from_label("Preorder now"),
            StockStatus::Preorder
        );
    }

    #[test]
    fn unrecognized_label_is_unknown() {
        assert_eq!(StockStatus::from_label("Ask in store"), StockStatus::Unknown);
    }

    #[test]
    fn empty_label_is_unknown() {
        assert_eq!(StockStatus::from_label("   "), StockStatus::Unknown);
    }

    #[test]
    fn from_label_is_idempotent_on_canonical_strings() {
        let first = StockStatus::from_label("in stock");
        let second = StockStatus::from_label(first.as_str());
        assert_eq!(first, second);
    }

    #[test]
    fn is_available_derivation_matches_spec_invariant() {
        assert_eq!(StockStatus::InStock.is_available(), Some(true));
        assert_eq!(StockStatus::OutOfStock.is_available(), Some(false));
        assert_eq!(StockStatus::LowStock.is_available(), None);
        assert_eq!(StockStatus::Backorder.is_available(), None);
        assert_eq!(StockStatus::Preorder.is_available(), None);
        assert_eq!(StockStatus::Unknown.is_available(), None);
    }
}
