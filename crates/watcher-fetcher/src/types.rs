use std::time::Duration;

/// Which path produced a [`FetchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Static,
    Rendered,
}

impl FetchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchMode::Static => "static",
            FetchMode::Rendered => "rendered",
        }
    }
}

/// Timing breakdown for a single fetch attempt, kept for logging and for
/// the dynamic-content escalation heuristics.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub total: Duration,
}

/// Metadata about how a page was obtained, separate from its body so
/// extraction code can stay indifferent to fetch mode.
#[derive(Debug, Clone)]
pub struct FetchMetadata {
    pub mode: FetchMode,
    pub final_url: String,
    pub status: u16,
    pub timing: Timing,
    pub escalated: bool,
}

/// The body and metadata of a completed fetch. The Fetcher's outward
/// contract never raises on a page that is merely hard to parse — that is
/// the Extractor's concern. `FetchResult` is only produced on success;
/// hard failures (network errors, timeouts, non-recoverable statuses)
/// surface as [`crate::FetchError`].
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub html: String,
    pub metadata: FetchMetadata,
}
