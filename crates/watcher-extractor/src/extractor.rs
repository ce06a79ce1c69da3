use serde_json::{json, Map, Value};

use watcher_core::shell::{ProductShell, VariantShell};

use crate::merge::{build_variant, merge_variants};
use crate::strategies::{dom, embedded, jsonld, meta, Strategy};

/// Which strategy produced each recovered field, for logging and for the
/// `source` column on stock/price history rows.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub title_source: Option<&'static str>,
    pub price_source: Option<&'static str>,
    pub stock_source: Option<&'static str>,
    pub variant_sources: Vec<&'static str>,
    /// Human-readable trail of what each strategy found or skipped. Used by
    /// tests and diagnostics; part of the contract, not incidental logging.
    pub notes: Vec<String>,
    /// `true` when one or more expected fields could not be recovered by
    /// any strategy. Never fatal — callers still receive whatever was
    /// found — but worth surfacing as `EXTRACTION_DEGRADED`.
    pub degraded: bool,
}

struct JsonLdTitleStrategy;

impl Strategy<String> for JsonLdTitleStrategy {
    fn name(&self) -> &'static str {
        jsonld::STRATEGY_NAME
    }

    fn try_extract(&self, html: &str) -> Option<String> {
        jsonld::extract_jsonld_product(html).and_then(|p| p.title)
    }
}

struct MetaTitleStrategy;

impl Strategy<String> for MetaTitleStrategy {
    fn name(&self) -> &'static str {
        meta::STRATEGY_NAME
    }

    fn try_extract(&self, html: &str) -> Option<String> {
        meta::extract_title(html)
    }
}

struct DomTitleStrategy;

impl Strategy<String> for DomTitleStrategy {
    fn name(&self) -> &'static str {
        dom::STRATEGY_NAME
    }

    fn try_extract(&self, html: &str) -> Option<String> {
        dom::extract_title(html)
    }
}

/// Title priority chain per the strategy registry: JSON-LD wins, then Open
/// Graph/Twitter meta, then the DOM `<h1>` fallback.
fn title_strategies() -> [&'static dyn Strategy<String>; 3] {
    [&JsonLdTitleStrategy, &MetaTitleStrategy, &DomTitleStrategy]
}

fn script_tag_pattern() -> &'static regex::Regex {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r#"(?is)<script\b[^>]*>(.*?)</script>"#).unwrap())
}

/// Counts `<script>` blocks whose body parses as JSON, a rough signal for
/// how much structured data a page carries (surfaced in extraction
/// metadata for diagnostics).
fn count_json_blobs(html: &str) -> usize {
    script_tag_pattern()
        .captures_iter(html)
        .filter(|c| {
            c.get(1)
                .is_some_and(|m| serde_json::from_str::<serde_json::Value>(m.as_str().trim()).is_ok())
        })
        .count()
}

/// Extracts everything the pipeline can determine about a product from raw
/// page HTML. Never returns an error: malformed or unexpected HTML simply
/// yields fewer recovered fields, reflected in [`ExtractionReport::degraded`].
pub fn extract(html: &str, canonical_url: &str) -> (ProductShell, ExtractionReport) {
    let mut report = ExtractionReport::default();

    let jsonld_product = jsonld::extract_jsonld_product(html);
    let json_blobs_count = count_json_blobs(html);

    let title = crate::strategies::extract_first(html, &title_strategies()).map(|(t, source)| {
        report.title_source = Some(source);
        report.notes.push(format!("title recovered via {source}"));
        t
    });
    if title.is_none() {
        report.notes.push("title not recovered by any strategy".to_string());
    }

    let description = jsonld_product
        .as_ref()
        .and_then(|p| p.description.clone())
        .or_else(|| meta::extract_description(html));

    let vendor = jsonld_product.as_ref().and_then(|p| p.vendor.clone());

    let images = {
        let mut found = jsonld_product
            .as_ref()
            .map(|p| p.images.clone())
            .unwrap_or_default();
        if found.is_empty() {
            found.extend(meta::extract_image(html));
        }
        if found.is_empty() {
            found.extend(dom::extract_first_image(html));
        }
        found
    };

    let top_level_price = jsonld_product.as_ref().and_then(|p| {
        p.price.map(|amount| {
            report.price_source = Some(jsonld::STRATEGY_NAME);
            (amount, p.currency.clone())
        })
    });

    let top_level_stock = jsonld_product.as_ref().and_then(|p| {
        p.availability.map(|status| {
            report.stock_source = Some(jsonld::STRATEGY_NAME);
            status
        })
    });

    let embedded_variants = embedded::extract_embedded_variants(html);
    let from_embedded: Vec<VariantShell> = embedded_variants
        .into_iter()
        .map(|v| {
            report.variant_sources.push(embedded::STRATEGY_NAME);
            build_variant(
                v.sku,
                v.attributes,
                v.price.map(|amount| (amount, v.currency)),
                v.stock,
            )
        })
        .collect();

    let jsonld_variants = jsonld::extract_jsonld_variants(html);
    let from_jsonld_variants: Vec<VariantShell> = jsonld_variants
        .into_iter()
        .map(|v| {
            report.variant_sources.push(jsonld::STRATEGY_NAME);
            build_variant(v.sku, v.attributes, v.price.map(|amount| (amount, v.currency)), v.availability)
        })
        .collect();

    let dom_variants = dom::extract_dom_variants(html);
    let from_dom_variants: Vec<VariantShell> = dom_variants
        .into_iter()
        .map(|v| {
            report.variant_sources.push(dom::STRATEGY_NAME);
            build_variant(None, v.attributes, None, None)
        })
        .collect();

    let mut variants = merge_variants(merge_variants(from_embedded, from_jsonld_variants), from_dom_variants);

    if variants.is_empty() {
        // No structured variant source at all: fall back to a single
        // implicit variant built from whatever top-level price/stock was
        // recovered, via either JSON-LD or the DOM button heuristic.
        let dom_price = if top_level_price.is_none() {
            dom::extract_price(html).map(|amount| {
                report.price_source = Some(dom::STRATEGY_NAME);
                (amount, None)
            })
        } else {
            None
        };

        let dom_stock = if top_level_stock.is_none() {
            dom::extract_stock_from_button(html).map(|status| {
                report.stock_source = Some(dom::STRATEGY_NAME);
                status
            })
        } else {
            None
        };

        let price = top_level_price.or(dom_price);
        let stock = top_level_stock.or(dom_stock);

        if price.is_some() || stock.is_some() {
            report.variant_sources.push(
                report
                    .price_source
                    .or(report.stock_source)
                    .unwrap_or("implicit"),
            );
            variants.push(build_variant(None, Map::new(), price, stock));
        }
    } else {
        // Structured variants exist but may be missing a top-level price/
        // stock verdict on each one; let any page-level JSON-LD price/
        // stock fill gaps on a single-variant product.
        if variants.len() == 1 {
            if variants[0].price.is_none() {
                if let Some((amount, currency)) = &top_level_price {
                    variants[0].price = build_variant(None, Map::new(), Some((*amount, currency.clone())), None).price;
                }
            }
            if variants[0].stock.is_none() {
                if let Some(status) = top_level_stock {
                    variants[0].stock = build_variant(None, Map::new(), None, Some(status)).stock;
                }
            }
        }
    }

    report.degraded = title.is_none() || images.is_empty() || variants.is_empty();
    if report.degraded {
        report.notes.push("extraction degraded: one or more fields unrecovered".to_string());
        tracing::debug!(
            url = canonical_url,
            title_recovered = title.is_some(),
            image_count = images.len(),
            variant_count = variants.len(),
            "extraction degraded"
        );
    }

    let metadata = match json!({
        "isLikelyDynamic": report.degraded && json_blobs_count == 0,
        "jsonBlobsCount": json_blobs_count,
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let product = ProductShell {
        canonical_url: canonical_url.to_string(),
        title,
        description,
        vendor,
        images,
        variants,
        metadata,
    };

    (product, report)
}
