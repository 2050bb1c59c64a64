//! Utility functions for URL handling, text cleanup, and logging.
//!
//! This module provides helpers used throughout the crate:
//! - Relative-to-absolute link resolution and host matching
//! - Whitespace collapsing, HTML stripping and escaping for captions
//! - Char-safe truncation for logs and captions

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Resolve `href` against the page it was found on.
///
/// Links that already start with `http` are parsed as-is; everything else
/// (`/news/1.html`, `../a`, `?page=2`) is joined onto `base`.
///
/// # Returns
///
/// The absolute URL, or `None` if the result cannot be parsed.
///
/// # Examples
///
/// ```ignore
/// let base = Url::parse("https://www.tourdom.ru/news/").unwrap();
/// assert_eq!(
///     absolutize(&base, "/news/a.html").unwrap().as_str(),
///     "https://www.tourdom.ru/news/a.html"
/// );
/// ```
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with("http") {
        Url::parse(href).ok()
    } else {
        base.join(href).ok()
    }
}

/// Whether `url`'s host ends with `host_tail` (e.g. `"tourdom.ru"`).
pub fn host_matches(url: &Url, host_tail: &str) -> bool {
    url.host_str()
        .is_some_and(|host| host.ends_with(host_tail))
}

/// Collapse runs of whitespace (including newlines from nested markup)
/// into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Strip HTML tags from a string and normalize whitespace.
///
/// Feed summaries frequently carry markup; captions need plain text.
pub fn strip_html(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Decode HTML character references (`&laquo;`, `&nbsp;`, `&#171;`) in
/// plain text. Whitespace is left as is.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let fragment = scraper::Html::parse_fragment(text);
    fragment.root_element().text().collect()
}

/// Escape the three characters Telegram's HTML parse mode cares about.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Shorten `s` to at most `max` characters, replacing the tail with `…`.
///
/// Counts characters, not bytes, so Cyrillic text is never split mid-char.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push('…');
    out
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a byte
/// count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}
