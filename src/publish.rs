//! Delivery of news items to the downstream channel.
//!
//! The ingestion cycle only knows the [`Publisher`] trait. Two
//! implementations are provided:
//!
//! | Publisher | Used when | Effect |
//! |-----------|-----------|--------|
//! | [`TelegramPublisher`] | normal runs | `sendPhoto` / `sendMessage` via the Bot API |
//! | [`LogPublisher`] | `--dry-run` | logs the caption, always succeeds |
//!
//! # Caption Format
//!
//! ```text
//! <b>{title}</b>
//! {summary as plain text, at most 300 chars}
//!
//! <a href="{link}">Читать на {source}</a>
//! ```
//!
//! Title and summary are HTML-escaped because the Bot API parses the caption
//! in HTML mode.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::PublishError;
use crate::http::Session;
use crate::models::NewsItem;
use crate::utils::{escape_html, strip_html, truncate_chars};

/// Summaries longer than this are cut to `SUMMARY_MAX - 3` chars plus `…`.
pub const SUMMARY_MAX: usize = 300;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Downstream channel for delivered items.
///
/// An `Err` means the item was not delivered; the cycle leaves it unmarked
/// so the next cycle tries again.
pub trait Publisher {
    async fn deliver(
        &self,
        item: &NewsItem,
        preview_image: Option<&str>,
    ) -> Result<(), PublishError>;
}

/// Build the HTML caption for `item`.
pub fn format_caption(item: &NewsItem) -> String {
    let mut parts = vec![format!("<b>{}</b>", escape_html(&item.title))];

    let summary = strip_html(&item.summary);
    if !summary.is_empty() {
        parts.push(escape_html(&truncate_chars(&summary, SUMMARY_MAX)));
    }

    parts.push(format!(
        "\n<a href=\"{}\">Читать на {}</a>",
        escape_html(item.link.as_str()),
        escape_html(&item.source_name)
    ));
    parts.join("\n")
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts items to a Telegram channel through the Bot API.
pub struct TelegramPublisher {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramPublisher")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramPublisher {
    /// Create a publisher sharing the process-wide HTTP session.
    ///
    /// # Arguments
    ///
    /// * `session` - Shared outbound session (timeout, `User-Agent`)
    /// * `api_base` - Bot API root, normally [`TELEGRAM_API`]
    /// * `token` - Bot token
    /// * `chat_id` - Target channel (`@name` or `-100…`)
    pub fn new(
        session: &Session,
        api_base: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client: session.client().clone(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), PublishError> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&text).ok();

        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(PublishError::Rejected {
                status: status.as_u16(),
                description: api.description.unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(PublishError::Rejected {
                status: status.as_u16(),
                description: crate::utils::truncate_for_log(&text, 200),
            }),
        }
    }

    async fn send_message(&self, caption: &str) -> Result<(), PublishError> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": self.chat_id,
                "text": caption,
                "parse_mode": "HTML",
                "disable_web_page_preview": false,
            }),
        )
        .await
    }
}

impl Publisher for TelegramPublisher {
    #[instrument(level = "info", skip_all, fields(url = %item.link, source = %item.source_name))]
    async fn deliver(
        &self,
        item: &NewsItem,
        preview_image: Option<&str>,
    ) -> Result<(), PublishError> {
        let caption = format_caption(item);

        if let Some(photo) = preview_image {
            let sent = self
                .call(
                    "sendPhoto",
                    json!({
                        "chat_id": self.chat_id,
                        "photo": photo,
                        "caption": caption,
                        "parse_mode": "HTML",
                    }),
                )
                .await;
            match sent {
                Ok(()) => {
                    info!(title = %item.title, "Posted with photo");
                    return Ok(());
                }
                // A dead image URL must not block the item forever.
                Err(PublishError::Rejected { status, description }) if status == 400 => {
                    warn!(%photo, %description, "Photo rejected; sending text only");
                }
                Err(e) => return Err(e),
            }
        }

        self.send_message(&caption).await?;
        info!(title = %item.title, "Posted");
        Ok(())
    }
}

/// Logs items instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    async fn deliver(
        &self,
        item: &NewsItem,
        preview_image: Option<&str>,
    ) -> Result<(), PublishError> {
        info!(
            source = %item.source_name,
            url = %item.link,
            image = preview_image.unwrap_or("-"),
            caption = %format_caption(item),
            "Dry run: would post"
        );
        Ok(())
    }
}
