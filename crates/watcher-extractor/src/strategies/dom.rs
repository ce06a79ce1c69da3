use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use watcher_core::stock::StockStatus;

/// The strategy name recorded as a stock/price history `source`.
pub const STRATEGY_NAME: &str = "dom";

fn h1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?is)<h1[^>]*>(.*?)</h1>"#).unwrap())
}

fn tag_strip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"<[^>]+>"#).unwrap())
}

/// Extracts the page title from the first `<h1>`, the fallback source when
/// no JSON-LD or embedded product blob is present.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = h1_pattern().captures(html)?.get(1)?.as_str();
    let text = tag_strip_pattern().replace_all(raw, "").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn price_near_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)class="[^"]*price[^"]*"[^>]*>\s*\$?\s*([0-9]+(?:[.,][0-9]{2})?)"#)
            .unwrap()
    })
}

/// Extracts a price from the first element whose `class` attribute
/// contains "price", e.g. `<span class="product-price">$19.99</span>`.
pub fn extract_price(html: &str) -> Option<Decimal> {
    let raw = price_near_class_pattern().captures(html)?.get(1)?.as_str();
    raw.replace(',', "").parse().ok()
}

fn img_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?is)<img\b([^>]*)>"#).unwrap())
}

fn img_src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?is)\bsrc=["']([^"']+)["']"#).unwrap())
}

fn img_dimension_pattern(attr: &str) -> Regex {
    Regex::new(&format!(r#"(?is)\b{attr}=["']?([0-9]+)"#)).unwrap()
}

/// Finds the first `<img>` that doesn't look like a tiny icon (any declared
/// `width`/`height` below this is assumed to be chrome, not a product
/// photo). Images with no declared size are given the benefit of the doubt.
const ICON_SIZE_THRESHOLD_PX: u32 = 32;

/// Last-resort image fallback: the first plausibly-large `<img src>` on the
/// page, when no JSON-LD or Open Graph image was found.
pub fn extract_first_image(html: &str) -> Option<String> {
    for capture in img_tag_pattern().captures_iter(html) {
        let attrs = capture.get(1)?.as_str();
        let looks_like_icon = ["width", "height"].iter().any(|attr| {
            img_dimension_pattern(attr)
                .captures(attrs)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .is_some_and(|px| px < ICON_SIZE_THRESHOLD_PX)
        });
        if looks_like_icon {
            continue;
        }
        if let Some(src) = img_src_pattern()
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        {
            return Some(src);
        }
    }
    None
}

fn add_to_cart_button_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<button[^>]*(disabled)?[^>]*>\s*(add to cart|buy now|add to bag)\s*</button>"#)
            .unwrap()
    })
}

/// Infers stock status from whether the add-to-cart button is disabled.
/// This is deliberately the lowest-priority stock strategy: a disabled
/// button is strong evidence of being out of stock, but its absence is
/// weak evidence of being in stock (the button may simply render
/// elsewhere), so an unmatched page yields `None`, not `InStock`.
pub fn extract_stock_from_button(html: &str) -> Option<StockStatus> {
    let captures = add_to_cart_button_pattern().captures(html)?;
    if captures.get(1).is_some() {
        Some(StockStatus::OutOfStock)
    } else {
        Some(StockStatus::InStock)
    }
}

fn select_block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?is)<select\b([^>]*)>(.*?)</select>"#).unwrap())
}

fn option_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?is)<option\b([^>]*)>(.*?)</option>"#).unwrap())
}

fn radio_input_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?is)<input\b([^>]*)>"#).unwrap())
}

fn swatch_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<[a-z]+\b[^>]*\bdata-option=["']([^"']+)["'][^>]*\bdata-value=["']([^"']+)["'][^>]*>"#)
            .unwrap()
    })
}

fn swatch_tag_pattern_reversed() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<[a-z]+\b[^>]*\bdata-value=["']([^"']+)["'][^>]*\bdata-option=["']([^"']+)["'][^>]*>"#)
            .unwrap()
    })
}

/// Pulls a single `name="..."` style attribute value out of an attribute
/// fragment. Built per call rather than cached, matching
/// `img_dimension_pattern`'s treatment of runtime-chosen attribute names.
fn attr_value(attrs: &str, name: &str) -> Option<String> {
    Regex::new(&format!(r#"(?is)\b{name}=["']([^"']*)["']"#))
        .ok()?
        .captures(attrs)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

const PLACEHOLDER_OPTION_MARKERS: [&str; 2] = ["choose", "select"];

/// A variant attribute recovered from page markup (a `<select>` option, a
/// radio-group choice, or a swatch anchor) rather than from any embedded
/// JSON. Carries only a single attribute, since each DOM control contributes
/// one dimension at a time; `merge_variants` unions these against any
/// JSON-derived variant list by attribute equality.
#[derive(Debug, Clone, PartialEq)]
pub struct DomVariant {
    pub attributes: Map<String, Value>,
}

/// Recovers per-option variant attributes from the three DOM conventions
/// storefronts commonly use when no embedded JSON carries the variant list:
/// `<select>`/`<option>` dropdowns, radio-button groups, and swatch anchors
/// carrying `data-option`/`data-value` pairs.
pub fn extract_dom_variants(html: &str) -> Vec<DomVariant> {
    let mut variants = select_variants(html);
    variants.extend(radio_variants(html));
    variants.extend(swatch_variants(html));
    variants
}

fn select_variants(html: &str) -> Vec<DomVariant> {
    let mut out = Vec::new();
    for select in select_block_pattern().captures_iter(html) {
        let select_attrs = select.get(1).map_or("", |m| m.as_str());
        let inner = select.get(2).map_or("", |m| m.as_str());
        let dimension = attr_value(select_attrs, "name")
            .map(|n| n.to_lowercase())
            .unwrap_or_else(|| "option".to_string());

        for option in option_tag_pattern().captures_iter(inner) {
            let option_attrs = option.get(1).map_or("", |m| m.as_str());
            if option_attrs.to_lowercase().contains("disabled") {
                continue;
            }
            let label = tag_strip_pattern()
                .replace_all(option.get(2).map_or("", |m| m.as_str()), "")
                .trim()
                .to_string();
            let value = attr_value(option_attrs, "value").unwrap_or_default();
            let chosen = if value.trim().is_empty() { label.clone() } else { value };
            if chosen.trim().is_empty()
                || PLACEHOLDER_OPTION_MARKERS.iter().any(|marker| label.to_lowercase().contains(marker))
            {
                continue;
            }

            let mut attributes = Map::new();
            attributes.insert(dimension.clone(), Value::String(chosen));
            out.push(DomVariant { attributes });
        }
    }
    out
}

fn radio_variants(html: &str) -> Vec<DomVariant> {
    let mut out = Vec::new();
    for input in radio_input_pattern().captures_iter(html) {
        let attrs = input.get(1).map_or("", |m| m.as_str());
        let is_radio = attr_value(attrs, "type").is_some_and(|t| t.eq_ignore_ascii_case("radio"));
        if !is_radio || attrs.to_lowercase().contains("disabled") {
            continue;
        }
        let Some(name) = attr_value(attrs, "name").map(|n| n.to_lowercase()) else {
            continue;
        };
        let Some(value) = attr_value(attrs, "value").filter(|v| !v.trim().is_empty()) else {
            continue;
        };

        let mut attributes = Map::new();
        attributes.insert(name, Value::String(value));
        out.push(DomVariant { attributes });
    }
    out
}

fn swatch_variants(html: &str) -> Vec<DomVariant> {
    let mut out = Vec::new();
    for capture in swatch_tag_pattern().captures_iter(html) {
        let option = capture[1].to_lowercase();
        let value = capture[2].to_string();
        let mut attributes = Map::new();
        attributes.insert(option, Value::String(value));
        out.push(DomVariant { attributes });
    }
    for capture in swatch_tag_pattern_reversed().captures_iter(html) {
        let value = capture[1].to_string();
        let option = capture[2].to_lowercase();
        let mut attributes = Map::new();
        attributes.insert(option, Value::String(value));
        out.push(DomVariant { attributes });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_from_h1_stripping_nested_tags() {
        let html = r#"<h1>Widget <span class="badge">New</span></h1>"#;
        assert_eq!(extract_title(html).as_deref(), Some("Widget New"));
    }

    #[test]
    fn missing_h1_yields_none_title() {
        assert!(extract_title("<div>no heading</div>").is_none());
    }

    #[test]
    fn extracts_price_near_price_class() {
        let html = r#"<span class="product-price">$19.99</span>"#;
        assert_eq!(extract_price(html), Some("19.99".parse().unwrap()));
    }

    #[test]
    fn extracts_price_with_thousands_separator() {
        let html = r#"<div class="price-now">1,249.00</div>"#;
        assert_eq!(extract_price(html), Some("1249.00".parse().unwrap()));
    }

    #[test]
    fn enabled_add_to_cart_button_means_in_stock() {
        let html = r#"<button class="buy">Add to Cart</button>"#;
        assert_eq!(extract_stock_from_button(html), Some(StockStatus::InStock));
    }

    #[test]
    fn disabled_add_to_cart_button_means_out_of_stock() {
        let html = r#"<button disabled class="buy">Add to Cart</button>"#;
        assert_eq!(
            extract_stock_from_button(html),
            Some(StockStatus::OutOfStock)
        );
    }

    #[test]
    fn no_button_yields_no_verdict() {
        assert!(extract_stock_from_button("<div>nothing here</div>").is_none());
    }

    #[test]
    fn first_image_skips_small_icons() {
        let html = r#"
            <img src="logo.png" width="16" height="16">
            <img src="product.jpg" width="600" height="600">
        "#;
        assert_eq!(extract_first_image(html).as_deref(), Some("product.jpg"));
    }

    #[test]
    fn first_image_accepts_images_with_no_declared_size() {
        let html = r#"<img src="product.jpg">"#;
        assert_eq!(extract_first_image(html).as_deref(), Some("product.jpg"));
    }

    #[test]
    fn no_img_tags_yields_none() {
        assert!(extract_first_image("<div>no images</div>").is_none());
    }

    #[test]
    fn select_options_become_one_variant_each() {
        let html = r#"
            <select name="Size">
                <option value="">Choose an option</option>
                <option value="S">Small</option>
                <option value="M">Medium</option>
            </select>
        "#;
        let variants = extract_dom_variants(html);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].attributes.get("size").and_then(Value::as_str), Some("S"));
        assert_eq!(variants[1].attributes.get("size").and_then(Value::as_str), Some("M"));
    }

    #[test]
    fn disabled_options_are_skipped() {
        let html = r#"
            <select name="size">
                <option value="S">S</option>
                <option value="L" disabled>L (sold out)</option>
            </select>
        "#;
        let variants = extract_dom_variants(html);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].attributes.get("size").and_then(Value::as_str), Some("S"));
    }

    #[test]
    fn radio_group_yields_one_variant_per_enabled_choice() {
        let html = r#"
            <input type="radio" name="color" value="Red">
            <input type="radio" name="color" value="Blue" disabled>
        "#;
        let variants = extract_dom_variants(html);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].attributes.get("color").and_then(Value::as_str), Some("Red"));
    }

    #[test]
    fn swatch_anchors_are_recovered_regardless_of_attribute_order() {
        let html = r#"
            <a class="swatch" data-option="Color" data-value="Red"></a>
            <a class="swatch" data-value="Blue" data-option="Color"></a>
        "#;
        let variants = extract_dom_variants(html);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].attributes.get("color").and_then(Value::as_str), Some("Red"));
        assert_eq!(variants[1].attributes.get("color").and_then(Value::as_str), Some("Blue"));
    }

    #[test]
    fn no_variant_controls_yields_empty_list() {
        assert!(extract_dom_variants("<div>plain page</div>").is_empty());
    }
}
