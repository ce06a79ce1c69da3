/// Errors the Fetcher can raise. Fetch failures are always reported through
/// this taxonomy rather than leaking transport-library errors to callers.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Failed(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("rendered fetch failed: {0}")]
    RenderFailed(String),
    #[error("upstream returned status {0}")]
    BadStatus(u16),
}

impl FetchError {
    /// Stable machine-readable error code for logs and downstream consumers.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Failed(_) | FetchError::BadStatus(_) => "FETCH_FAILED",
            FetchError::Timeout(_) => "FETCH_TIMEOUT",
            FetchError::RenderFailed(_) => "RENDER_FAILED",
        }
    }

    /// Whether retrying the same request again is worth attempting.
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::Timeout(_) => true,
            FetchError::BadStatus(status) => *status == 429 || *status >= 500,
            FetchError::Failed(err) => err.is_connect() || err.is_timeout(),
            FetchError::RenderFailed(_) => false,
        }
    }
}
