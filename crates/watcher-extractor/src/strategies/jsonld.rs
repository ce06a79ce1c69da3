use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use watcher_core::stock::StockStatus;

/// The strategy name recorded as a stock/price history `source`.
pub const STRATEGY_NAME: &str = "jsonld";

fn script_block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#)
            .unwrap()
    })
}

/// Parsed pieces of a schema.org `Product` JSON-LD block relevant to this
/// system; any field absent from the page is `None`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JsonLdProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub images: Vec<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub availability: Option<StockStatus>,
}

/// Scans `html` for `<script type="application/ld+json">` blocks and
/// returns the first one that parses as (or contains, in an `@graph`) a
/// `Product`.
pub fn extract_jsonld_product(html: &str) -> Option<JsonLdProduct> {
    for capture in script_block_pattern().captures_iter(html) {
        let raw = capture.get(1)?.as_str();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if let Some(product) = find_product_node(&value).and_then(json_to_product) {
            return Some(product);
        }
    }
    None
}

fn find_product_node(value: &Value) -> Option<&Value> {
    if is_product_type(value) {
        return Some(value);
    }
    if let Some(graph) = value.get("@graph").and_then(Value::as_array) {
        for node in graph {
            if is_product_type(node) {
                return Some(node);
            }
        }
    }
    None
}

fn is_product_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("product"),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|s| s.eq_ignore_ascii_case("product"))),
        _ => false,
    }
}

fn json_to_product(node: &Value) -> Option<JsonLdProduct> {
    let title = node.get("name").and_then(Value::as_str).map(str::to_string);
    let description = node
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let vendor = brand_name(node.get("brand"));

    let images = match node.get("image") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    // For the top-level product view, a multi-offer array collapses to its
    // first entry: per-offer detail becomes a variant list via
    // `extract_jsonld_variants` instead.
    let offers = node.get("offers").map(|offers| match offers {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    });

    let (price, currency, availability) = match &offers {
        Some(offers_obj) => offer_fields(offers_obj),
        None => (None, None, None),
    };

    if title.is_none() && images.is_empty() && price.is_none() && availability.is_none() {
        return None;
    }

    Some(JsonLdProduct {
        title,
        description,
        vendor,
        images,
        price,
        currency,
        availability,
    })
}

/// schema.org `Product.brand` is either a bare string or a `Brand`/
/// `Organization` object carrying `name`.
fn brand_name(brand: Option<&Value>) -> Option<String> {
    match brand? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Pulls `price`/`priceCurrency`/`availability` off a single schema.org
/// `Offer` node. Shared by the top-level single-offer view and by
/// multi-variant extraction below.
fn offer_fields(offer: &Value) -> (Option<Decimal>, Option<String>, Option<StockStatus>) {
    let price = offer
        .get("price")
        .and_then(|p| p.as_str().map(str::to_string).or_else(|| p.as_f64().map(|f| f.to_string())))
        .and_then(|s| s.parse::<Decimal>().ok());
    let currency = offer
        .get("priceCurrency")
        .and_then(Value::as_str)
        .map(str::to_string);
    let availability = offer
        .get("availability")
        .and_then(Value::as_str)
        .map(StockStatus::from_label);
    (price, currency, availability)
}

/// Non-standard but common direct keys some storefronts emit on an `Offer`
/// or variant `Product` node, outside schema.org's formal
/// `additionalProperty` mechanism — the JSON-LD analogue of
/// `strategies/embedded.rs`'s `option1`/`option2` convention.
const DIRECT_ATTRIBUTE_KEYS: [&str; 5] = ["size", "color", "material", "style", "fit"];

/// Pulls recognizable variant dimensions off a JSON-LD node: schema.org's
/// `additionalProperty` list of `PropertyValue {name, value}` pairs, plus
/// any of `DIRECT_ATTRIBUTE_KEYS` present as a direct string field.
fn attribute_map(node: &Value) -> Map<String, Value> {
    let mut attributes = Map::new();

    if let Some(props) = node.get("additionalProperty").and_then(Value::as_array) {
        for prop in props {
            let name = prop.get("name").and_then(Value::as_str);
            let value = prop.get("value").and_then(Value::as_str);
            if let (Some(name), Some(value)) = (name, value) {
                attributes.insert(name.to_lowercase(), Value::String(value.to_string()));
            }
        }
    }

    for key in DIRECT_ATTRIBUTE_KEYS {
        if let Some(value) = node.get(key).and_then(Value::as_str) {
            attributes.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    attributes
}

/// One purchasable configuration recovered from a JSON-LD `Product`'s
/// `offers` array or `hasVariant` list.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonLdVariant {
    pub sku: Option<String>,
    pub attributes: Map<String, Value>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub availability: Option<StockStatus>,
}

/// Scans `html` for a JSON-LD `Product` node carrying more than one
/// variant, via either a multi-entry `offers` array (one entry per
/// purchasable configuration) or a `hasVariant` array (nested `Product`
/// nodes, schema.org's variant-grouping shape). A single-offer product —
/// the common case — yields an empty list, since that case is already
/// covered by `extract_jsonld_product`'s top-level price.
pub fn extract_jsonld_variants(html: &str) -> Vec<JsonLdVariant> {
    for capture in script_block_pattern().captures_iter(html) {
        let Some(raw) = capture.get(1) else { continue };
        let Ok(value) = serde_json::from_str::<Value>(raw.as_str().trim()) else {
            continue;
        };
        let Some(node) = find_product_node(&value) else {
            continue;
        };

        if let Some(offers) = node.get("offers").and_then(Value::as_array) {
            if offers.len() > 1 {
                let variants: Vec<_> = offers.iter().filter_map(offer_to_variant).collect();
                if !variants.is_empty() {
                    return variants;
                }
            }
        }

        if let Some(variants) = node.get("hasVariant").and_then(Value::as_array) {
            let variants: Vec<_> = variants.iter().filter_map(variant_node_to_variant).collect();
            if !variants.is_empty() {
                return variants;
            }
        }
    }
    Vec::new()
}

fn offer_to_variant(offer: &Value) -> Option<JsonLdVariant> {
    let sku = offer.get("sku").and_then(Value::as_str).map(str::to_string);
    let attributes = attribute_map(offer);
    let (price, currency, availability) = offer_fields(offer);

    if sku.is_none() && attributes.is_empty() && price.is_none() {
        return None;
    }

    Some(JsonLdVariant {
        sku,
        attributes,
        price,
        currency,
        availability,
    })
}

fn variant_node_to_variant(node: &Value) -> Option<JsonLdVariant> {
    let sku = node.get("sku").and_then(Value::as_str).map(str::to_string);
    let attributes = attribute_map(node);

    let offer = node.get("offers").map(|offers| match offers {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    });
    let (price, currency, availability) = match &offer {
        Some(offer) => offer_fields(offer),
        None => (None, None, None),
    };

    if sku.is_none() && attributes.is_empty() && price.is_none() {
        return None;
    }

    Some(JsonLdVariant {
        sku,
        attributes,
        price,
        currency,
        availability,
    })
}
