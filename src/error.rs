//! Typed errors for fetching, storage, delivery, and configuration.
//!
//! Fetch errors never leave the fetchers: [`crate::feed::FeedFetcher`] and
//! [`crate::http::PageFetcher`] log them and hand back an empty result.
//! Store and publish errors reach the cycle, which logs them per item.
//! Only [`ConfigError`] is allowed to stop the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid URL \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid timestamp \"{value}\" for {url}")]
    InvalidTimestamp { url: String, value: String },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("destination rejected message (status {status}): {description}")]
    Rejected { status: u16, description: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("no sources configured")]
    NoSources,

    #[error("source #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("source {source_name}: {field} \"{value}\" is not an absolute http(s) URL")]
    InvalidUrl {
        source_name: String,
        field: &'static str,
        value: String,
    },

    #[error("missing required setting {0} (set it or pass --dry-run)")]
    MissingDestination(&'static str),
}
