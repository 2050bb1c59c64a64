//! Selection rules shared by the site-specific strategies.
//!
//! Every domain strategy runs the same pipeline with its own parameters:
//!
//! 1. anchors from the primary selector (secondary only if primary finds none)
//! 2. href present and link text non-empty
//! 3. link text carries no blocked keyword
//! 4. href resolved against the listing page
//! 5. resolved link contains the path marker
//! 6. resolved host ends with the site's suffix
//! 7. title length (in characters) within bounds
//! 8. first occurrence wins per resolved link
//! 9. boilerplate link texts dropped (case-insensitive)
//! 10. capped
//!
//! Steps 2 to 7 decide whether the primary selector found anything, so a
//! page whose primary links are all blocked falls through to the secondary.

use std::ops::RangeInclusive;

use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::RawCandidate;
use crate::normalize::KeywordFilter;
use crate::utils::{absolutize, collapse_whitespace, host_matches};

/// Parameters of one site's extraction pipeline.
#[derive(Debug, Clone)]
pub struct DomainRules {
    pub host_suffix: &'static str,
    pub path_marker: &'static str,
    pub title_len: RangeInclusive<usize>,
    /// Lowercase link texts that never name an article.
    pub stoplist: &'static [&'static str],
    pub cap: usize,
}

impl DomainRules {
    /// Run the pipeline over `document`.
    pub fn apply(
        &self,
        document: &Html,
        page_url: &Url,
        primary: &Selector,
        secondary: Option<&Selector>,
        keywords: &KeywordFilter,
    ) -> Vec<RawCandidate> {
        let mut candidates = self.collect(document, page_url, primary, keywords);
        if candidates.is_empty() {
            if let Some(secondary) = secondary {
                debug!(host = self.host_suffix, "Primary selector empty; trying secondary");
                candidates = self.collect(document, page_url, secondary, keywords);
            }
        }

        candidates
            .into_iter()
            .unique_by(|c| c.href.clone())
            .filter(|c| !self.is_boilerplate(&c.title))
            .take(self.cap)
            .collect()
    }

    fn collect(
        &self,
        document: &Html,
        page_url: &Url,
        selector: &Selector,
        keywords: &KeywordFilter,
    ) -> Vec<RawCandidate> {
        let mut out = Vec::new();
        for anchor in document.select(selector) {
            let Some(href) = anchor.value().attr("href").filter(|h| !h.trim().is_empty()) else {
                continue;
            };
            let title = collapse_whitespace(&anchor.text().collect::<String>());
            if title.is_empty() || keywords.is_blocked(&title) {
                continue;
            }
            let Some(link) = absolutize(page_url, href) else {
                continue;
            };
            if !link.as_str().contains(self.path_marker) || !host_matches(&link, self.host_suffix) {
                continue;
            }
            if !self.title_len.contains(&title.chars().count()) {
                continue;
            }
            out.push(RawCandidate::new(title, link.to_string(), ""));
        }
        out
    }

    fn is_boilerplate(&self, title: &str) -> bool {
        let lowered = title.trim().to_lowercase();
        self.stoplist.iter().any(|stop| *stop == lowered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: DomainRules = DomainRules {
        host_suffix: "example.ru",
        path_marker: "/news/",
        title_len: 5..=20,
        stoplist: &["читать далее"],
        cap: 2,
    };

    fn page() -> Url {
        Url::parse("https://www.example.ru/news/").unwrap()
    }

    #[test]
    fn secondary_only_when_primary_is_empty() {
        let html = Html::parse_document(
            r#"<div class="list"><a href="/news/1">Headline one</a></div>
               <p><a href="/news/2">Headline two</a></p>"#,
        );
        let primary = Selector::parse(".list a[href]").unwrap();
        let secondary = Selector::parse("p a[href]").unwrap();

        let out = RULES.apply(&html, &page(), &primary, Some(&secondary), &KeywordFilter::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Headline one");

        let empty_primary = Selector::parse(".missing a[href]").unwrap();
        let out = RULES.apply(&html, &page(), &empty_primary, Some(&secondary), &KeywordFilter::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Headline two");
    }

    #[test]
    fn stoplist_is_case_insensitive_and_cap_applies() {
        let html = Html::parse_document(
            r#"<a href="/news/0"> ЧИТАТЬ ДАЛЕЕ </a>
               <a href="/news/1">Headline one</a>
               <a href="/news/2">Headline two</a>
               <a href="/news/3">Headline three</a>"#,
        );
        let all = Selector::parse("a[href]").unwrap();
        let out = RULES.apply(&html, &page(), &all, None, &KeywordFilter::default());
        assert_eq!(
            out.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            vec!["Headline one", "Headline two"]
        );
    }

    #[test]
    fn title_length_counts_characters() {
        // 13 chars but 26 bytes
        let html = Html::parse_document(r#"<a href="/news/1">ааааабббббввв</a>"#);
        let all = Selector::parse("a[href]").unwrap();
        let out = RULES.apply(&html, &page(), &all, None, &KeywordFilter::default());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn blocked_primary_links_fall_through_to_secondary() {
        let html = Html::parse_document(
            r#"<div class="list"><a href="/news/1">Strike news</a></div>
               <p><a href="/news/2">Headline two</a></p>"#,
        );
        let primary = Selector::parse(".list a[href]").unwrap();
        let secondary = Selector::parse("p a[href]").unwrap();

        let keywords = KeywordFilter::new(["strike"]);
        let out = RULES.apply(&html, &page(), &primary, Some(&secondary), &keywords);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Headline two");
    }

    #[test]
    fn blocked_links_do_not_use_up_the_cap() {
        let html = Html::parse_document(
            r#"<a href="/news/1">Strike one</a>
               <a href="/news/2">Strike two</a>
               <a href="/news/3">Headline a</a>
               <a href="/news/4">Headline b</a>
               <a href="/news/5">Headline c</a>"#,
        );
        let all = Selector::parse("a[href]").unwrap();
        let out = RULES.apply(&html, &page(), &all, None, &KeywordFilter::new(["STRIKE"]));
        assert_eq!(
            out.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            vec!["Headline a", "Headline b"]
        );
    }
}
