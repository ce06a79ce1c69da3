use serde_json::{Map, Value};

use watcher_core::attributes::normalize_attributes;
use watcher_core::shell::{Currency, PriceShell, StockShell, VariantShell};
use watcher_core::stock::StockStatus;

/// Folds a variant recovered from JSON-LD/embedded JSON/DOM strategies into
/// a [`VariantShell`], normalizing its attribute map so later dedup by
/// value (not key order) is reliable.
pub fn build_variant(
    sku: Option<String>,
    attributes: Map<String, Value>,
    price: Option<(rust_decimal::Decimal, Option<String>)>,
    stock: Option<StockStatus>,
) -> VariantShell {
    let normalized_attributes = match normalize_attributes(&attributes) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let price_shell = price.and_then(|(amount, currency)| {
        let currency = currency.as_deref().and_then(Currency::parse)?;
        Some(PriceShell { amount, currency })
    });

    VariantShell {
        sku,
        attributes: normalized_attributes,
        price: price_shell,
        stock: stock.map(|status| StockShell {
            status,
            quantity: None,
        }),
    }
}

/// Merges two variant lists recovered from different strategies (e.g. DOM
/// select-options plus an embedded JSON blob), producing one variant per
/// distinct identity. Identity is SKU when both sides have a non-empty SKU;
/// otherwise it's normalized-attribute equality, matching the variant
/// reconciliation rule used during ingestion. `primary` is assumed to carry
/// the higher-priority strategy's output: when both lists contribute a
/// variant for the same identity, the one with more populated fields wins;
/// ties keep `primary`'s candidate, per spec.md §4.2's merge rule.
pub fn merge_variants(primary: Vec<VariantShell>, secondary: Vec<VariantShell>) -> Vec<VariantShell> {
    let mut merged = primary;

    for candidate in secondary {
        match merged.iter().position(|existing| same_identity(existing, &candidate)) {
            Some(index) => {
                if populated_field_count(&candidate) > populated_field_count(&merged[index]) {
                    merged[index] = candidate;
                }
            }
            None => merged.push(candidate),
        }
    }

    merged
}

fn same_identity(a: &VariantShell, b: &VariantShell) -> bool {
    match (&a.sku, &b.sku) {
        (Some(a_sku), Some(b_sku)) if !a_sku.is_empty() && !b_sku.is_empty() => a_sku == b_sku,
        _ => a.attributes == b.attributes,
    }
}

/// Counts how many of a variant's recoverable fields are actually present,
/// used to pick the more complete of two candidates sharing one identity.
fn populated_field_count(variant: &VariantShell) -> usize {
    usize::from(variant.sku.as_ref().is_some_and(|s| !s.is_empty()))
        + usize::from(!variant.attributes.is_empty())
        + usize::from(variant.price.is_some())
        + usize::from(variant.stock.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn variant(sku: Option<&str>, attrs: Value) -> VariantShell {
        let attributes = match attrs {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        VariantShell {
            sku: sku.map(str::to_string),
            attributes,
            price: None,
            stock: None,
        }
    }

    #[test]
    fn merges_without_duplicating_same_sku() {
        let primary = vec![variant(Some("A-1"), json!({}))];
        let secondary = vec![variant(Some("A-1"), json!({"color": "red"}))];
        let merged = merge_variants(primary, secondary);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn merges_distinct_skus_as_separate_variants() {
        let primary = vec![variant(Some("A-1"), json!({}))];
        let secondary = vec![variant(Some("A-2"), json!({}))];
        let merged = merge_variants(primary, secondary);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn falls_back_to_attribute_equality_without_sku() {
        let primary = vec![variant(None, json!({"color": "red", "size": "M"}))];
        let secondary = vec![variant(None, json!({"size": "M", "color": "red"}))];
        let merged = merge_variants(primary, secondary);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn different_attributes_without_sku_stay_distinct() {
        let primary = vec![variant(None, json!({"color": "red"}))];
        let secondary = vec![variant(None, json!({"color": "blue"}))];
        let merged = merge_variants(primary, secondary);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn shared_identity_prefers_the_more_complete_candidate() {
        let sparse = VariantShell {
            sku: Some("A-1".to_string()),
            attributes: Map::new(),
            price: None,
            stock: None,
        };
        let rich = VariantShell {
            sku: Some("A-1".to_string()),
            attributes: {
                let mut m = Map::new();
                m.insert("color".to_string(), json!("Blue"));
                m
            },
            price: Some(PriceShell {
                amount: "19.99".parse().unwrap(),
                currency: Currency::parse("USD").unwrap(),
            }),
            stock: None,
        };

        let merged = merge_variants(vec![sparse], vec![rich.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], rich);
    }

    #[test]
    fn shared_identity_keeps_primary_on_a_tie() {
        let primary = VariantShell {
            sku: Some("A-1".to_string()),
            attributes: Map::new(),
            price: None,
            stock: None,
        };
        let secondary = VariantShell {
            sku: Some("A-1".to_string()),
            attributes: Map::new(),
            price: None,
            stock: None,
        };

        let merged = merge_variants(vec![primary.clone()], vec![secondary]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], primary);
    }

    #[test]
    fn build_variant_rejects_unparseable_currency() {
        let variant = build_variant(
            Some("A-1".to_string()),
            Map::new(),
            Some(("19.99".parse().unwrap(), Some("US Dollars".to_string()))),
            None,
        );
        assert!(variant.price.is_none());
    }
}
