//! Tourister publications scraper.
//!
//! [Tourister](https://www.tourister.ru/publications) has no stable list
//! container, so the primary selector matches publication links directly.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{DomainRules, ExtractionStrategy};
use crate::models::RawCandidate;
use crate::normalize::KeywordFilter;

static PRIMARY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href*='/publications/']").unwrap());
// Absolute links on another scheme/host spelling can miss the attribute
// match; the path marker still restricts this to publications.
static SECONDARY: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

const RULES: DomainRules = DomainRules {
    host_suffix: "tourister.ru",
    path_marker: "/publications/",
    title_len: 15..=160,
    stoplist: &["новости", "читать далее", "далее", "подробнее"],
    cap: 25,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TouristerStrategy;

impl ExtractionStrategy for TouristerStrategy {
    fn name(&self) -> &'static str {
        "tourister"
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
