use regex::Regex;
use std::sync::OnceLock;

/// Thresholds controlling when a statically-fetched page is considered
/// "probably client-rendered" and worth escalating to a rendered fetch.
/// Exposed as a constructor parameter rather than a constant so callers can
/// tune it for sites with unusual markup.
#[derive(Debug, Clone, Copy)]
pub struct DynamicDetectionConfig {
    /// Minimum number of framework root-element markers (`id="root"`,
    /// `id="app"`, `ng-version`, ...) that must be present.
    pub min_root_markers: usize,
    /// Body byte length below which a page is considered suspiciously thin
    /// for a product page.
    pub thin_body_bytes: usize,
}

impl Default for DynamicDetectionConfig {
    fn default() -> Self {
        Self {
            min_root_markers: 1,
            thin_body_bytes: 2000,
        }
    }
}

fn root_marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(id="root"|id="app"|ng-version|data-reactroot|__next)"#).unwrap()
    })
}

fn noscript_warning_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<noscript>.*?(enable javascript|requires javascript).*?</noscript>"#)
            .unwrap()
    })
}

/// Returns `true` when `html` shows signs of needing client-side
/// rendering to produce real content: a framework root marker combined
/// with either a thin body or an explicit "enable JavaScript" notice.
pub fn looks_dynamic(html: &str, config: DynamicDetectionConfig) -> bool {
    let marker_count = root_marker_pattern().find_iter(html).count();
    if marker_count < config.min_root_markers {
        return false;
    }

    html.len() < config.thin_body_bytes || noscript_warning_pattern().is_match(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_static_page_is_not_dynamic() {
        let html = "<html><body><h1>Widget</h1><p>A fine widget.</p></body></html>".repeat(20);
        assert!(!looks_dynamic(&html, DynamicDetectionConfig::default()));
    }

    #[test]
    fn thin_react_root_is_dynamic() {
        let html = r#"<html><body><div id="root"></div></body></html>"#;
        assert!(looks_dynamic(html, DynamicDetectionConfig::default()));
    }

    #[test]
    fn noscript_warning_is_dynamic() {
        let html = format!(
            "<html><body><div id=\"app\"></div><noscript>Please enable JavaScript to continue.</noscript></body></html>{}",
            "x".repeat(3000)
        );
        assert!(looks_dynamic(&html, DynamicDetectionConfig::default()));
    }

    #[test]
    fn large_body_without_root_marker_is_not_dynamic() {
        let html = format!("<html><body>{}</body></html>", "content ".repeat(500));
        assert!(!looks_dynamic(&html, DynamicDetectionConfig::default()));
    }
}
