use std::time::Duration;

use crate::client::StaticFetcher;
use crate::dynamic::{looks_dynamic, DynamicDetectionConfig};
use crate::rate_limit::retry_with_backoff;
use crate::render::{ChromiumProcessRenderer, Renderer};
use crate::types::{FetchMetadata, FetchMode, FetchResult, Timing};
use crate::FetchError;

/// Top-level entry point for obtaining a page. Always tries a static fetch
/// first; escalates to a rendered fetch at most once when the static
/// result looks client-rendered.
pub struct Fetcher {
    static_fetcher: StaticFetcher,
    renderer: Box<dyn Renderer>,
    render_timeout: Duration,
    dynamic_config: DynamicDetectionConfig,
}

impl Fetcher {
    pub fn new(
        user_agent: impl Into<String>,
        http_timeout: Duration,
        render_timeout: Duration,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            static_fetcher: StaticFetcher::new(user_agent, http_timeout)?,
            renderer: Box::new(ChromiumProcessRenderer::default()),
            render_timeout,
            dynamic_config: DynamicDetectionConfig::default(),
        })
    }

    /// Swaps in a different renderer (used by tests to avoid invoking a
    /// real browser binary).
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_dynamic_config(mut self, config: DynamicDetectionConfig) -> Self {
        self.dynamic_config = config;
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let static_result =
            retry_with_backoff(|_attempt| self.static_fetcher.fetch(url)).await?;

        if !looks_dynamic(&static_result.html, self.dynamic_config) {
            return Ok(static_result);
        }

        tracing::info!(url, "static fetch looked dynamic, escalating to rendered fetch");

        match self.renderer.render(url, self.render_timeout).await {
            Ok(html) => Ok(FetchResult {
                html,
                metadata: FetchMetadata {
                    mode: FetchMode::Rendered,
                    final_url: url.to_string(),
                    status: static_result.metadata.status,
                    timing: Timing {
                        total: static_result.metadata.timing.total,
                    },
                    escalated: true,
                },
            }),
            Err(err) => {
                tracing::warn!(url, error = %err, "rendered fetch failed, falling back to static result");
                Ok(static_result)
            }
        }
    }
}
