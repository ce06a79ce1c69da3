use std::sync::OnceLock;

use regex::Regex;

/// The strategy name recorded as a stock/price history `source`.
pub const STRATEGY_NAME: &str = "meta";

fn meta_tag_pattern(property: &str) -> Regex {
    Regex::new(&format!(
        r#"(?is)<meta[^>]+(?:property|name)=["']{property}["'][^>]*content=["']([^"']*)["']"#
    ))
    .unwrap()
}

// `content` can also precede `property`/`name` in the attribute order, so
// each tag is tried both ways before giving up on it.
fn content_first_pattern(property: &str) -> Regex {
    Regex::new(&format!(
        r#"(?is)<meta[^>]+content=["']([^"']*)["'][^>]*(?:property|name)=["']{property}["']"#
    ))
    .unwrap()
}

fn extract_meta_content(html: &str, property: &str) -> Option<String> {
    meta_tag_pattern(property)
        .captures(html)
        .or_else(|| content_first_pattern(property).captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Tries `og:title`, then `twitter:title`.
pub fn extract_title(html: &str) -> Option<String> {
    extract_meta_content(html, "og:title").or_else(|| extract_meta_content(html, "twitter:title"))
}

/// Tries `og:description`, then `twitter:description`.
pub fn extract_description(html: &str) -> Option<String> {
    extract_meta_content(html, "og:description")
        .or_else(|| extract_meta_content(html, "twitter:description"))
}

/// Tries `og:image`, then `twitter:image`.
pub fn extract_image(html: &str) -> Option<String> {
    extract_meta_content(html, "og:image").or_else(|| extract_meta_content(html, "twitter:image"))
}

fn product_og_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]+property=["']og:type["'][^>]*content=["']product["']"#)
            .unwrap()
    })
}

/// Whether the page declares `og:type` as `product`, one of the dynamic-
/// rendering signal checks the Fetcher uses to decide whether a page looks
/// like a product page at all.
pub fn has_product_og_type(html: &str) -> bool {
    product_og_type_pattern().is_match(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_og_title_description_and_image() {
        let html = r#"
            <head>
            <meta property="og:title" content="Widget">
            <meta property="og:description" content="A fine widget.">
            <meta property="og:image" content="https://example.com/w.jpg">
            </head>
        "#;
        assert_eq!(extract_title(html).as_deref(), Some("Widget"));
        assert_eq!(extract_description(html).as_deref(), Some("A fine widget."));
        assert_eq!(extract_image(html).as_deref(), Some("https://example.com/w.jpg"));
    }

    #[test]
    fn falls_back_to_twitter_tags_when_og_absent() {
        let html = r#"<meta name="twitter:title" content="Gizmo">"#;
        assert_eq!(extract_title(html).as_deref(), Some("Gizmo"));
    }

    #[test]
    fn tolerates_content_attribute_before_property() {
        let html = r#"<meta content="Widget" property="og:title">"#;
        assert_eq!(extract_title(html).as_deref(), Some("Widget"));
    }

    #[test]
    fn missing_tags_yield_none() {
        assert!(extract_title("<head></head>").is_none());
        assert!(extract_description("<head></head>").is_none());
        assert!(extract_image("<head></head>").is_none());
    }

    #[test]
    fn detects_product_og_type() {
        let html = r#"<meta property="og:type" content="product">"#;
        assert!(has_product_og_type(html));
        assert!(!has_product_og_type("<meta property=\"og:type\" content=\"website\">"));
    }
}
