//! TourDom listing scraper.
//!
//! Scrapes [TourDom](https://www.tourdom.ru/news/). News links sit inside
//! `<article>` blocks or `.news-list` / `.news` regions; when a redesign
//! drops those containers, any anchor whose href contains `/news/` is used.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{DomainRules, ExtractionStrategy};
use crate::models::RawCandidate;
use crate::normalize::KeywordFilter;

static PRIMARY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article a[href], .news-list a[href], .news a[href]").unwrap()
});
static SECONDARY: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href*='/news/']").unwrap());

const RULES: DomainRules = DomainRules {
    host_suffix: "tourdom.ru",
    path_marker: "/news/",
    title_len: 15..=160,
    stoplist: &["новости", "читать далее", "ещё"],
    cap: 25,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TourDomStrategy;

impl ExtractionStrategy for TourDomStrategy {
    fn name(&self) -> &'static str {
        "tourdom"
    }

    fn domain_suffix(&self) -> &'static str {
        RULES.host_suffix
    }

    fn extract_from(
        &self,
        document: &Html,
        page_url: &Url,
        keywords: &KeywordFilter,
    ) -> Vec<RawCandidate> {
        RULES.apply(document, page_url, &PRIMARY, Some(&SECONDARY), keywords)
    }
}
