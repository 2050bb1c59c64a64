//! Feed fetching and parsing.
//!
//! Handles RSS 2.0 (`<item>`), RSS 1.0/RDF (`<item>`) and Atom (`<entry>`)
//! documents. Entries are returned in the order the feed declares them,
//! which for every configured source is newest-first.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::http::Session;
use crate::models::RawCandidate;
use crate::normalize::KeywordFilter;
use crate::utils::decode_entities;

/// Only the first this-many feed entries are considered.
pub const MAX_FEED_ENTRIES: usize = 30;

/// Fetches a feed and turns it into raw candidates.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    session: Session,
}

impl FeedFetcher {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Fetch and parse `feed_url`, dropping entries with blocked titles.
    ///
    /// Any network or parse failure is logged and yields an empty vector:
    /// a broken feed means "no items from the feed this cycle".
    #[instrument(level = "info", skip(self, keywords))]
    pub async fn fetch(&self, feed_url: &str, keywords: &KeywordFilter) -> Vec<RawCandidate> {
        let body = match self.session.get_text(feed_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %feed_url, error = %e, "Feed fetch failed");
                return Vec::new();
            }
        };

        match parse_feed(&body) {
            Ok(mut candidates) => {
                keywords.retain(&mut candidates);
                info!(url = %feed_url, count = candidates.len(), "Parsed feed");
                candidates
            }
            Err(e) => {
                warn!(url = %feed_url, error = %e, "Feed parse failed");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Other,
}

#[derive(Default)]
struct Entry {
    title: String,
    link: String,
    summary: String,
}

impl Entry {
    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Title => self.title.push_str(text),
            Field::Link => self.link.push_str(text),
            Field::Summary => self.summary.push_str(text),
            Field::Other => {}
        }
    }

    fn into_candidate(self) -> Option<RawCandidate> {
        let title = self.title.trim();
        let link = self.link.trim();
        if title.is_empty() || link.is_empty() {
            return None;
        }
        Some(RawCandidate::new(title, link, self.summary.trim()))
    }
}

fn field_for(name: &[u8]) -> Field {
    match name {
        b"title" => Field::Title,
        b"link" => Field::Link,
        b"description" | b"summary" | b"content" => Field::Summary,
        _ => Field::Other,
    }
}

/// Atom carries the link in an attribute; RSS `<link>` never has `href`.
fn atom_href(e: &BytesStart<'_>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return None;
    }
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Unescape a text node.
///
/// XML only knows five named entities; feeds routinely carry HTML ones
/// (`&laquo;`, `&nbsp;`) that quick-xml rejects. Those chunks are decoded
/// as HTML instead.
fn text_content(e: &BytesText<'_>) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(err) => {
            debug!(error = %err, "Text is not plain XML; decoding HTML entities");
            let raw = std::str::from_utf8(e)
                .map(|raw| raw.to_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
            decode_entities(&raw)
        }
    }
}

/// Parse a feed document into candidates.
///
/// The first [`MAX_FEED_ENTRIES`] entries are considered; of those, entries
/// without a title or link are skipped. Summaries default to an empty string.
///
/// # Errors
///
/// Returns [`FetchError::Xml`] if the XML is malformed.
pub fn parse_feed(xml: &str) -> Result<Vec<RawCandidate>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut candidates = Vec::new();
    let mut entries_seen = 0usize;
    let mut entry: Option<Entry> = None;
    let mut field = Field::Other;
    // Depth of the current field element inside the entry, so markup nested
    // inside <content type="xhtml"> does not reset the field.
    let mut field_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name == b"item" || name == b"entry" {
                    entry = Some(Entry::default());
                    field = Field::Other;
                    field_depth = 0;
                } else if let Some(current) = entry.as_mut() {
                    if field_depth > 0 {
                        field_depth += 1;
                    } else {
                        field = field_for(name);
                        if field != Field::Other {
                            field_depth = 1;
                        }
                        if field == Field::Link {
                            if let Some(href) = atom_href(&e) {
                                current.link = href;
                            }
                        }
                        if field == Field::Summary && !current.summary.is_empty() {
                            // <description> wins over a later <content>
                            field = Field::Other;
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(current) = entry.as_mut() {
                    if field_depth == 0 && e.name().as_ref() == b"link" && current.link.is_empty() {
                        if let Some(href) = atom_href(&e) {
                            current.link = href;
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name == b"item" || name == b"entry" {
                    if let Some(finished) = entry.take() {
                        entries_seen += 1;
                        if let Some(candidate) = finished.into_candidate() {
                            candidates.push(candidate);
                        }
                        if entries_seen >= MAX_FEED_ENTRIES {
                            break;
                        }
                    }
                } else if field_depth > 0 {
                    field_depth -= 1;
                    if field_depth == 0 {
                        field = Field::Other;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = entry.as_mut() {
                    let text = text_content(&e);
                    if field == Field::Summary && !current.summary.is_empty() {
                        current.summary.push(' ');
                    }
                    current.push(field, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = entry.as_mut() {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    current.push(field, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::Xml(e)),
            _ => {}
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>TourDom</title>
    <link>https://www.tourdom.ru/news/</link>
    <item>
      <title>  Турция открыла сезон  </title>
      <link>https://www.tourdom.ru/news/turkey.html</link>
      <description><![CDATA[<p>Первые чартеры &amp; отели</p>]]></description>
    </item>
    <item>
      <title>Без ссылки</title>
      <description>skipped</description>
    </item>
    <item>
      <title>Египет &amp; визы</title>
      <link>https://www.tourdom.ru/news/egypt.html</link>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Tourister</title>
  <link href="https://www.tourister.ru/"/>
  <entry>
    <title>Путешествие по Алтаю</title>
    <link rel="alternate" href="https://www.tourister.ru/publications/1"/>
    <link rel="enclosure" href="https://www.tourister.ru/img/1.jpg"/>
    <summary>Короткий рассказ</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_in_order_and_skips_incomplete() {
        let items = parse_feed(SAMPLE_RSS).expect("valid RSS");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Турция открыла сезон");
        assert_eq!(items[0].href, "https://www.tourdom.ru/news/turkey.html");
        assert_eq!(items[0].summary, "<p>Первые чартеры &amp; отели</p>");
        assert_eq!(items[1].title, "Египет & визы");
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn parses_atom_alternate_link() {
        let items = parse_feed(SAMPLE_ATOM).expect("valid Atom");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://www.tourister.ru/publications/1");
        assert_eq!(items[0].summary, "Короткий рассказ");
    }

    #[test]
    fn only_first_thirty_entries_are_considered() {
        let mut xml = String::from("<rss><channel>");
        // entry 0 has no link: it still counts toward the cap
        xml.push_str("<item><title>no link</title></item>");
        for i in 1..40 {
            xml.push_str(&format!(
                "<item><title>Item {i}</title><link>https://example.com/{i}</link></item>"
            ));
        }
        xml.push_str("</channel></rss>");

        let items = parse_feed(&xml).unwrap();
        assert_eq!(items.len(), MAX_FEED_ENTRIES - 1);
        assert_eq!(items.last().unwrap().title, "Item 29");
    }

    #[test]
    fn html_entities_in_text_are_decoded() {
        let xml = r#"<rss><channel>
            <item>
                <title>Турция &laquo;открыла&raquo; сезон</title>
                <link>https://www.tourdom.ru/news/1.html</link>
                <description>Цены&nbsp;снижены &amp; это &#8212; хорошо</description>
            </item>
            <item>
                <title>Египет &amp; визы</title>
                <link>https://www.tourdom.ru/news/2.html</link>
            </item>
        </channel></rss>"#;

        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Турция «открыла» сезон");
        assert_eq!(items[0].summary, "Цены\u{a0}снижены & это — хорошо");
        assert_eq!(items[1].title, "Египет & визы");
    }

    #[test]
    fn empty_channel_returns_empty_vec() {
        let items = parse_feed(r#"<?xml version="1.0"?><rss><channel></channel></rss>"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        let result = parse_feed("<rss><channel><item><title>x</link></item></channel></rss>");
        assert!(matches!(result, Err(FetchError::Xml(_))));
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let items = FeedFetcher::new(session)
            .fetch(&format!("{}/rss", server.uri()), &KeywordFilter::default())
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn fetch_parses_served_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_RSS))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let items = FeedFetcher::new(session)
            .fetch(&format!("{}/rss", server.uri()), &KeywordFilter::default())
            .await;
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn fetch_drops_blocked_titles() {
        let server = MockServer::start().await;
        let xml = r#"<rss><channel>
            <item><title>Президент подписал указ</title><link>https://www.tourdom.ru/news/1.html</link></item>
            <item><title>Новые рейсы в Анталью</title><link>https://www.tourdom.ru/news/2.html</link></item>
            <item><title>САНКЦИИ и туризм</title><link>https://www.tourdom.ru/news/3.html</link></item>
        </channel></rss>"#;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(xml))
            .mount(&server)
            .await;

        let session = Session::new(Duration::from_secs(5), "newsbot-test/0.1").unwrap();
        let items = FeedFetcher::new(session)
            .fetch(&format!("{}/rss", server.uri()), &KeywordFilter::political())
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].href, "https://www.tourdom.ru/news/2.html");
    }
}
