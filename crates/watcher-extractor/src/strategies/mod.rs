//! One module per extraction concern, each holding a small set of
//! strategies tried in a fixed priority order — the first strategy that
//! returns `Some` wins.

pub mod dom;
pub mod embedded;
pub mod jsonld;
pub mod meta;

/// A single technique for recovering one piece of data from raw HTML.
/// Strategies never panic and never see malformed input as fatal — they
/// simply return `None` when they can't find what they're looking for.
pub trait Strategy<T> {
    fn name(&self) -> &'static str;
    fn try_extract(&self, html: &str) -> Option<T>;
}

/// Runs `strategies` in order, returning the first non-`None` result along
/// with the name of the strategy that produced it.
pub fn extract_first<T>(html: &str, strategies: &[&dyn Strategy<T>]) -> Option<(T, &'static str)> {
    for strategy in strategies {
        if let Some(value) = strategy.try_extract(html) {
            return Some((value, strategy.name()));
        }
    }
    None
}
