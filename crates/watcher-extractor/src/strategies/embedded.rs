use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::jsonpass::find_balanced;
use watcher_core::stock::StockStatus;

/// The strategy name recorded as a stock/price history `source`.
pub const STRATEGY_NAME: &str = "embedded-json";

/// A variant recovered from an inline `<script>` JSON blob (e.g.
/// `var product = {...}` or `window.__PRODUCT__ = {...}`), before it's
/// folded into a [`watcher_core::VariantShell`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedVariant {
    pub sku: Option<String>,
    pub attributes: Map<String, Value>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub stock: Option<StockStatus>,
}

fn variants_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""variants"\s*:\s*\["#).unwrap())
}

/// Scans `html` for a `"variants": [...]` array embedded in any
/// `<script>` block and returns the parsed variants, in document order.
pub fn extract_embedded_variants(html: &str) -> Vec<EmbeddedVariant> {
    let Some(key_match) = variants_key_pattern().find(html) else {
        return Vec::new();
    };

    let array_start = key_match.end() - 1;
    let Some(span) = find_balanced(html, array_start, b'[', b']') else {
        return Vec::new();
    };

    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(span) else {
        return Vec::new();
    };

    items.iter().filter_map(json_to_variant).collect()
}

fn json_to_variant(value: &Value) -> Option<EmbeddedVariant> {
    let object = value.as_object()?;

    let sku = object
        .get("sku")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut attributes = Map::new();
    if let Some(title) = object.get("title").and_then(Value::as_str) {
        attributes.insert("title".to_string(), Value::String(title.to_string()));
    }
    for option_key in ["option1", "option2", "option3"] {
        if let Some(opt) = object.get(option_key).and_then(Value::as_str) {
            attributes.insert(option_key.to_string(), Value::String(opt.to_string()));
        }
    }

    let price = object
        .get("price")
        .and_then(|p| {
            p.as_str()
                .map(str::to_string)
                .or_else(|| p.as_f64().map(|f| f.to_string()))
        })
        .and_then(|s| s.parse::<Decimal>().ok());

    let currency = object
        .get("currency")
        .or_else(|| object.get("price_currency"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let stock = object.get("available").and_then(Value::as_bool).map(|available| {
        if available {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    });

    if sku.is_none() && attributes.is_empty() && price.is_none() {
        return None;
    }

    Some(EmbeddedVariant {
        sku,
        attributes,
        price,
        currency,
        stock,
    })
}
