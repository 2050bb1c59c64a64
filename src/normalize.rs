//! Validation of raw candidates into [`NewsItem`]s, plus preview images.
//!
//! This is the only place scraped data is checked. A candidate becomes an
//! item when, after trimming, its title is non-empty, its link resolves to
//! an absolute `http`/`https` URL, and the title carries none of the blocked
//! keywords. Everything else is dropped without an error.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use crate::http::PageFetcher;
use crate::models::{NewsItem, RawCandidate};
use crate::utils::collapse_whitespace;

/// Titles containing any of these (case-insensitive) are never delivered.
pub const DEFAULT_BLOCKED_KEYWORDS: &[&str] = &[
    "политика",
    "санкции",
    "президент",
    "правительство",
    "выборы",
    "протест",
    "митинг",
    "война",
    "конфликт",
    "дипломатия",
    "внешняя политика",
    "геополитика",
    "парламент",
    "депутат",
    "кремль",
    "белый дом",
    "угрозы",
    "международные отношения",
];

static OG_IMAGE_SECURE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image:secure_url"]"#).unwrap());
static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());

/// Case-insensitive title blocklist.
///
/// Fetchers apply it while collecting, so blocked titles never count
/// toward a feed being non-empty, a primary selector having matched, or a
/// per-site cap. [`ItemNormalizer`] checks it again at the item boundary.
/// The default filter blocks nothing.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// The built-in political keyword list.
    pub fn political() -> Self {
        Self::new(DEFAULT_BLOCKED_KEYWORDS.iter().copied())
    }

    pub fn is_blocked(&self, title: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let lowered = title.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Drop candidates whose title is blocked, keeping the order.
    pub fn retain(&self, candidates: &mut Vec<RawCandidate>) {
        let before = candidates.len();
        candidates.retain(|c| !self.is_blocked(&c.title));
        let dropped = before - candidates.len();
        if dropped > 0 {
            debug!(dropped, "Dropped candidates with blocked keywords");
        }
    }
}

/// Turns candidates into items and looks up preview images.
#[derive(Debug, Clone)]
pub struct ItemNormalizer {
    keywords: KeywordFilter,
}

impl Default for ItemNormalizer {
    fn default() -> Self {
        Self::with_filter(KeywordFilter::political())
    }
}

impl ItemNormalizer {
    pub fn new<I, S>(blocked_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_filter(KeywordFilter::new(blocked_keywords))
    }

    pub fn with_filter(keywords: KeywordFilter) -> Self {
        Self { keywords }
    }

    /// The blocklist fetchers should apply while collecting.
    pub fn keywords(&self) -> &KeywordFilter {
        &self.keywords
    }

    /// Validate one candidate.
    pub fn normalize(&self, candidate: RawCandidate, source_name: &str) -> Option<NewsItem> {
        let title = collapse_whitespace(&candidate.title);
        if title.is_empty() {
            debug!(href = %candidate.href, "Dropping candidate without title");
            return None;
        }
        if self.is_blocked(&title) {
            debug!(%title, "Dropping candidate with blocked keyword");
            return None;
        }

        let link = match Url::parse(candidate.href.trim()) {
            Ok(link) if matches!(link.scheme(), "http" | "https") && link.host_str().is_some() => {
                link
            }
            _ => {
                debug!(href = %candidate.href, "Dropping candidate with unresolved link");
                return None;
            }
        };

        Some(NewsItem {
            title,
            link,
            summary: candidate.summary.trim().to_string(),
            source_name: source_name.to_string(),
        })
    }

    /// Validate a batch, keeping the input order.
    pub fn normalize_all(&self, candidates: Vec<RawCandidate>, source_name: &str) -> Vec<NewsItem> {
        candidates
            .into_iter()
            .filter_map(|c| self.normalize(c, source_name))
            .collect()
    }

    pub fn is_blocked(&self, title: &str) -> bool {
        self.keywords.is_blocked(title)
    }

    /// Fetch the item's own page and read its social preview image.
    ///
    /// Returns `None` if the page is unavailable or advertises no image;
    /// the item is still deliverable without one.
    #[instrument(level = "debug", skip(self, pages), fields(url = %link))]
    pub async fn preview_image(&self, pages: &PageFetcher, link: &Url) -> Option<String> {
        let document = pages.fetch_document(link.as_str()).await?;
        find_preview_image(&document, link)
    }
}

/// Read `og:image:secure_url`, falling back to `og:image`.
///
/// Relative image paths are resolved against the page URL.
pub fn find_preview_image(document: &Html, page_url: &Url) -> Option<String> {
    [&*OG_IMAGE_SECURE, &*OG_IMAGE]
        .into_iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .and_then(|content| page_url.join(content).ok())
        .map(|url| url.to_string())
}
