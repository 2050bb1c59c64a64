//! Listing-page extraction strategies.
//!
//! When a source has no feed, or its feed comes back empty, the listing page
//! is scraped instead. Every known site gets its own [`ExtractionStrategy`];
//! pages on unknown hosts go through [`generic::GenericStrategy`].
//!
//! # Supported Sites
//!
//! | Site | Module | Primary selector | Path marker | Cap |
//! |------|--------|------------------|-------------|-----|
//! | TourDom | [`tourdom`] | `article a[href], .news-list a[href], .news a[href]` | `/news/` | 25 |
//! | Tourister | [`tourister`] | `a[href*='/publications/']` | `/publications/` | 25 |
//! | anything else | [`generic`] | `article a[href]` | - | 20 |
//!
//! Adding a site means writing a strategy and registering it with
//! [`StrategyRegistry::register`]; the dispatcher itself never changes.

pub mod generic;
pub mod rules;
pub mod tourdom;
pub mod tourister;

use scraper::Html;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::FetchError;
use crate::http::PageFetcher;
use crate::models::RawCandidate;
use crate::normalize::KeywordFilter;

pub use generic::GenericStrategy;
pub use rules::DomainRules;
pub use tourdom::TourDomStrategy;
pub use tourister::TouristerStrategy;

/// Turns a parsed listing page into raw candidates.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Host suffix this strategy is responsible for (e.g. `"tourdom.ru"`).
    fn domain_suffix(&self) -> &'static str;

    /// Apply the site's selection rules to `document`, which was fetched
    /// from `page_url`. Relative links are resolved against `page_url`.
    /// Links whose text is blocked by `keywords` are skipped before any
    /// fallback or cap is decided.
    fn extract_from(
        &self,
        document: &Html,
        page_url: &Url,
        keywords: &KeywordFilter,
    ) -> Vec<RawCandidate>;
}

/// Domain-keyed set of strategies with a generic fallback.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: GenericStrategy,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(TourDomStrategy);
        registry.register(TouristerStrategy);
        registry
    }
}

impl StrategyRegistry {
    /// A registry that only knows the generic fallback.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: GenericStrategy,
        }
    }

    pub fn register(&mut self, strategy: impl ExtractionStrategy + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    /// Pick the strategy for `page_url`: the first registered strategy whose
    /// suffix ends the host wins, otherwise the generic fallback.
    pub fn select(&self, page_url: &Url) -> &dyn ExtractionStrategy {
        let host = page_url.host_str().unwrap_or_default();
        match self
            .strategies
            .iter()
            .find(|s| host.ends_with(s.domain_suffix()))
        {
            Some(strategy) => &**strategy,
            None => &self.fallback,
        }
    }

    /// Fetch `page_url` and extract candidates with the matching strategy.
    ///
    /// An unparseable URL or unavailable page yields an empty vector.
    #[instrument(level = "info", skip(self, pages, keywords))]
    pub async fn extract(
        &self,
        pages: &PageFetcher,
        page_url: &str,
        keywords: &KeywordFilter,
    ) -> Vec<RawCandidate> {
        let url = match parse_listing_url(page_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Skipping listing page");
                return Vec::new();
            }
        };
        let strategy = self.select(&url);

        let Some(document) = pages.fetch_document(page_url).await else {
            return Vec::new();
        };
        let candidates = strategy.extract_from(&document, &url, keywords);
        info!(
            strategy = strategy.name(),
            count = candidates.len(),
            url = %page_url,
            "Extracted listing candidates"
        );
        candidates
    }
}

fn parse_listing_url(page_url: &str) -> Result<Url, FetchError> {
    Url::parse(page_url).map_err(|source| FetchError::InvalidUrl {
        url: page_url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::Session;

    #[test]
    fn select_matches_host_suffix() {
        let registry = StrategyRegistry::default();
        let tourdom = Url::parse("https://www.tourdom.ru/news/").unwrap();
        let tourister = Url::parse("https://www.tourister.ru/publications").unwrap();
        let other = Url::parse("https://travel.example.com/").unwrap();

        assert_eq!(registry.select(&tourdom).name(), "tourdom");
        assert_eq!(registry.select(&tourister).name(), "tourister");
        assert_eq!(registry.select(&other).name(), "generic");
    }

    #[test]
    fn first_registered_match_wins() {
        struct Shadow;
        impl ExtractionStrategy for Shadow {
            fn name(&self) -> &'static str {
                "shadow"
            }
            fn domain_suffix(&self) -> &'static str {
                ".ru"
            }
            fn extract_from(&self, _: &Html, _: &Url, _: &KeywordFilter) -> Vec<RawCandidate> {
                Vec::new()
            }
        }

        let mut registry = StrategyRegistry::empty();
        registry.register(Shadow);
        registry.register(TourDomStrategy);
        let url = Url::parse("https://www.tourdom.ru/news/").unwrap();
        assert_eq!(registry.select(&url).name(), "shadow");
    }

    #[tokio::test]
    async fn extract_uses_generic_for_unknown_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <article><a href="/a">First story</a></article>
                    <div><a href="/b">Outside article</a></div>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let pages = PageFetcher::new(session);
        let items = StrategyRegistry::default()
            .extract(&pages, &format!("{}/list", server.uri()), &KeywordFilter::default())
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, format!("{}/a", server.uri()));
    }

    #[tokio::test]
    async fn extract_unavailable_page_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let pages = PageFetcher::new(session);
        let items = StrategyRegistry::default()
            .extract(&pages, &format!("{}/list", server.uri()), &KeywordFilter::default())
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn extract_invalid_listing_url_is_empty() {
        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let pages = PageFetcher::new(session);
        let items = StrategyRegistry::default()
            .extract(&pages, "not a url", &KeywordFilter::default())
            .await;
        assert!(items.is_empty());

        assert!(matches!(
            parse_listing_url("/news/relative"),
            Err(FetchError::InvalidUrl { url, .. }) if url == "/news/relative"
        ));
    }

    #[tokio::test]
    async fn generic_extraction_skips_blocked_titles_before_capping() {
        let server = MockServer::start().await;
        let mut body = String::new();
        for i in 0..5 {
            body.push_str(&format!(r#"<article><a href="/p/{i}">Выборы {i}</a></article>"#));
        }
        for i in 5..30 {
            body.push_str(&format!(r#"<article><a href="/p/{i}">Story {i}</a></article>"#));
        }
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let pages = PageFetcher::new(session);
        let items = StrategyRegistry::default()
            .extract(&pages, &format!("{}/list", server.uri()), &KeywordFilter::political())
            .await;
        assert_eq!(items.len(), 20);
        assert_eq!(items[0].title, "Story 5");
    }
}
