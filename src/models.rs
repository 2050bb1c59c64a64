//! Data models for sources, scraped candidates, and delivered items.
//!
//! This module defines the shapes that flow through one ingestion cycle:
//! - [`Source`]: Static description of a news source (feed and listing page)
//! - [`RawCandidate`]: Unvalidated title/link/summary triple from a feed or page
//! - [`NewsItem`]: Validated, canonical item ready for delivery
//! - [`PublishedRecord`]: Durable row remembering a delivered link
//!
//! Candidates are validated exactly once, in [`crate::normalize`]; everything
//! downstream of that boundary works with [`NewsItem`] and trusts its fields.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

/// A configured news source.
///
/// Sources are loaded once at startup and never change while the process
/// runs. A source with a `feed_url` is read through its feed first; the
/// listing page is the fallback when the feed yields nothing.
///
/// # Fields
///
/// * `name` - Display name, also used as the `source` column in the store
/// * `feed_url` - Optional RSS/Atom feed
/// * `page_url` - Listing page scraped when the feed is missing or empty
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    /// Display name of the source (e.g. `"TourDom"`).
    pub name: String,
    /// Feed URL, if the source publishes one.
    #[serde(default)]
    pub feed_url: Option<String>,
    /// Listing page URL used by the extraction strategies.
    pub page_url: String,
}

/// A loosely-shaped record produced by a feed parser or extraction strategy.
///
/// Nothing about a candidate is trusted: the title may be blank, the link
/// may be relative or use a non-web scheme. [`crate::normalize::ItemNormalizer`]
/// decides whether it becomes a [`NewsItem`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCandidate {
    pub title: String,
    pub href: String,
    pub summary: String,
}

impl RawCandidate {
    pub fn new(
        title: impl Into<String>,
        href: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            summary: summary.into(),
        }
    }
}

/// A validated news item.
///
/// Invariants: `title` is trimmed and non-empty, `link` is an absolute
/// `http`/`https` URL. The item lives only for the cycle that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    /// Trimmed, whitespace-collapsed headline.
    pub title: String,
    /// Absolute link to the article; also the deduplication key.
    pub link: Url,
    /// Trimmed summary, possibly empty, possibly containing HTML.
    pub summary: String,
    /// Name of the [`Source`] the item came from.
    pub source_name: String,
}

impl NewsItem {
    /// The key used by the dedup store.
    pub fn key(&self) -> &str {
        self.link.as_str()
    }
}

/// A row of the dedup store: a link that has already been delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_deserializes_without_feed() {
        let yaml = "name: Tourister\npage_url: https://www.tourister.ru/publications\n";
        let source: Source = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(source.name, "Tourister");
        assert!(source.feed_url.is_none());
    }

    #[test]
    fn news_item_key_is_the_serialized_link() {
        let item = NewsItem {
            title: "Title".into(),
            link: Url::parse("https://www.tourdom.ru/news/abc.html").unwrap(),
            summary: String::new(),
            source_name: "TourDom".into(),
        };
        assert_eq!(item.key(), "https://www.tourdom.ru/news/abc.html");
    }
}
