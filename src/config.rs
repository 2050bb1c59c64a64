//! Source configuration.
//!
//! Sources come from a YAML file when one is given, otherwise from the
//! built-in list. The file looks like:
//!
//! ```yaml
//! sources:
//!   - name: TourDom
//!     feed_url: https://www.tourdom.ru/news/rss/
//!     page_url: https://www.tourdom.ru/news/
//!   - name: Tourister
//!     page_url: https://www.tourister.ru/publications
//! blocked_keywords:
//!   - политика
//! ```
//!
//! `blocked_keywords` is optional and defaults to
//! [`DEFAULT_BLOCKED_KEYWORDS`](crate::normalize::DEFAULT_BLOCKED_KEYWORDS).

use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

use crate::error::ConfigError;
use crate::models::Source;
use crate::normalize::DEFAULT_BLOCKED_KEYWORDS;

/// Validated source list plus keyword filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourcesConfig {
    pub sources: Vec<Source>,
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,
}

fn default_blocked_keywords() -> Vec<String> {
    DEFAULT_BLOCKED_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                Source {
                    name: "TourDom".into(),
                    feed_url: Some("https://www.tourdom.ru/news/rss/".into()),
                    page_url: "https://www.tourdom.ru/news/".into(),
                },
                Source {
                    name: "Tourister".into(),
                    feed_url: Some("https://www.tourister.ru/publications/rss".into()),
                    page_url: "https://www.tourister.ru/publications".into(),
                },
            ],
            blocked_keywords: default_blocked_keywords(),
        }
    }
}

impl SourcesConfig {
    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the built-in sources when `path` is `None`.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Read {
                        path: path.to_string(),
                        source,
                    })?;
                Self::from_yaml(&text)?
            }
        };
        info!(
            sources = config.sources.len(),
            keywords = config.blocked_keywords.len(),
            "Loaded source configuration"
        );
        Ok(config)
    }

    /// Check names and URLs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoSources`], [`ConfigError::EmptyName`], or
    /// [`ConfigError::InvalidUrl`] for the first offending source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for (index, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { index });
            }
            check_url(&source.name, "page_url", &source.page_url)?;
            if let Some(feed) = &source.feed_url {
                check_url(&source.name, "feed_url", feed)?;
            }
        }
        Ok(())
    }
}

fn check_url(source_name: &str, field: &'static str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            source_name: source_name.to_string(),
            field,
            value: value.to_string(),
        }),
    }
}
