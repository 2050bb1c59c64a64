//! Fallback for listing pages on hosts without a dedicated strategy.
//!
//! Takes every anchor inside an `<article>` that has an href and text.
//! Only the keyword blocklist applies; no path, host, length or stoplist
//! filtering.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::ExtractionStrategy;
use crate::models::RawCandidate;
use crate::normalize::KeywordFilter;
use crate::utils::{absolutize, collapse_whitespace};

static ARTICLE_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("article a[href]").unwrap());

const CAP: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl ExtractionStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn domain_suffix(&self) -> &'static str {
        ""
    }

    fn extract_from(
        &self,
        document: &Html,
        page_url: &Url,
        keywords: &KeywordFilter,
    ) -> Vec<RawCandidate> {
        document
            .select(&ARTICLE_LINKS)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                let title = collapse_whitespace(&anchor.text().collect::<String>());
                if title.is_empty() || href.trim().is_empty() || keywords.is_blocked(&title) {
                    return None;
                }
                let link = absolutize(page_url, href)?;
                Some(RawCandidate::new(title, link.to_string(), ""))
            })
            .take(CAP)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_article_anchors_only() {
        let page = Url::parse("https://travel.example.com/blog/").unwrap();
        let html = Html::parse_document(
            r#"<article><a href="post-1">Hi</a><a href="/x"> </a></article>
               <nav><a href="/menu">Menu entry</a></nav>
               <article><a href="https://cdn.example.net/p">Elsewhere</a></article>"#,
        );
        let items = GenericStrategy.extract_from(&html, &page, &KeywordFilter::default());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].href, "https://travel.example.com/blog/post-1");
        assert_eq!(items[0].title, "Hi");
        assert_eq!(items[1].href, "https://cdn.example.net/p");
    }

    #[test]
    fn caps_at_twenty() {
        let mut html = String::new();
        for i in 0..30 {
            html.push_str(&format!(r#"<article><a href="/p/{i}">Post {i}</a></article>"#));
        }
        let page = Url::parse("https://travel.example.com/").unwrap();
        let document = Html::parse_document(&html);
        let items = GenericStrategy.extract_from(&document, &page, &KeywordFilter::default());
        assert_eq!(items.len(), 20);
    }
}
