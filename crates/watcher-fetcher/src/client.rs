use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use reqwest::{Client, StatusCode};

use crate::types::{FetchMetadata, FetchMode, FetchResult, Timing};
use crate::FetchError;

/// Plain HTTP fetch, no JavaScript execution. The first path tried for
/// every check; escalates to a rendered fetch only when
/// [`crate::dynamic`]'s heuristics flag the page as likely
/// client-rendered.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: Client,
    user_agent: String,
}

impl StaticFetcher {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let user_agent = user_agent.into();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(FetchError::Failed)?;

        Ok(Self { client, user_agent })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(classify_status(status));
        }

        let html = response.text().await.map_err(classify_transport_error)?;

        Ok(FetchResult {
            html,
            metadata: FetchMetadata {
                mode: FetchMode::Static,
                final_url,
                status: status.as_u16(),
                timing: Timing {
                    total: started.elapsed(),
                },
                escalated: false,
            },
        })
    }
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(Duration::from_secs(0))
    } else {
        FetchError::Failed(err)
    }
}

fn classify_status(status: StatusCode) -> FetchError {
    FetchError::BadStatus(status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_returns_html_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = StaticFetcher::new("test-agent/1.0", Duration::from_secs(5)).unwrap();
        let result = fetcher
            .fetch(&format!("{}/product", server.uri()))
            .await
            .unwrap();

        assert_eq!(result.html, "<html>ok</html>");
        assert_eq!(result.metadata.status, 200);
        assert_eq!(result.metadata.mode, FetchMode::Static);
    }

    #[tokio::test]
    async fn fetch_maps_404_to_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = StaticFetcher::new("test-agent/1.0", Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::BadStatus(404)));
        assert!(!err.is_retriable());
    }

    #[tokio::test]
    async fn fetch_maps_503_to_retriable_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = StaticFetcher::new("test-agent/1.0", Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/flaky", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::BadStatus(503)));
        assert!(err.is_retriable());
    }
}
