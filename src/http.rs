//! Shared outbound HTTP session and the listing-page fetcher.
//!
//! One [`Session`] is built at startup and cloned into every component
//! that talks to the network. `reqwest::Client` is reference-counted, so
//! clones share the same connection pool, timeout, and `User-Agent`.

use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;

/// Desktop browser UA; several sources serve stripped pages to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Process-scoped HTTP session.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Build the shared client with a fixed timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// [`FetchError::UnexpectedStatus`] for non-2xx responses,
    /// [`FetchError::Http`] for network failures and timeouts.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Fetches listing and article pages as parsed HTML documents.
///
/// All network faults are absorbed here: callers get `None` and a warning
/// is logged, never an error.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    session: Session,
}

impl PageFetcher {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Fetch `url` and parse it, or `None` when the page is unavailable.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_document(&self, url: &str) -> Option<Html> {
        let body = self.fetch_body(url).await?;
        let document = Html::parse_document(&body);
        debug!(bytes = body.len(), "Parsed page");
        Some(document)
    }

    /// Fetch the raw body of `url`, or `None` when the page is unavailable.
    pub async fn fetch_body(&self, url: &str) -> Option<String> {
        match self.session.get_text(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(%url, error = %e, "GET failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout: Duration) -> PageFetcher {
        PageFetcher::new(Session::new(timeout, "newsbot-test/0.1").unwrap())
    }

    #[tokio::test]
    async fn fetch_document_parses_successful_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body><h1>Hi</h1></body></html>"),
            )
            .mount(&server)
            .await;

        let doc = fetcher(Duration::from_secs(5))
            .fetch_document(&format!("{}/news/", server.uri()))
            .await
            .expect("page should be available");
        let h1 = scraper::Selector::parse("h1").unwrap();
        assert_eq!(doc.select(&h1).count(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = fetcher(Duration::from_secs(5))
            .fetch_document(&format!("{}/news/", server.uri()))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let result = fetcher(Duration::from_millis(50))
            .fetch_body(&server.uri())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn get_text_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        match session.get_text(&server.uri()).await {
            Err(FetchError::UnexpectedStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }
}
