// src/services/telegram.rs

//! Notification delivery through the Telegram Bot API.
//!
//! The outbound message is a single text blob: a fixed prefix carrying the
//! header, title and date, the announcement body in the middle, and the
//! source URL as suffix. The whole message never exceeds the endpoint's
//! 4096-unit limit; the body gives way first, then the suffix. The prefix
//! is never dropped.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::TelegramConfig;
use crate::error::{AppError, Result};
use crate::models::Announcement;
use crate::utils::text::{truncate_units, unit_len};

/// Hard ceiling on outbound message length, in text units.
/// Matches the Telegram `sendMessage` documented limit.
pub const MESSAGE_LIMIT: usize = 4096;

/// Appended to a body that had to be cut short.
pub const TRUNCATION_MARKER: &str = "[...]";

const HEADER: &str = "New announcement on TLSContact";

/// Delivery endpoint for announcement notifications.
///
/// The orchestrator only sees this trait, so tests can substitute a fake
/// that records calls instead of talking to the network.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one announcement. Must not retry internally; a failed
    /// delivery is reported to the caller, which leaves state unadvanced
    /// so the next scheduled run retries.
    async fn send(&self, announcement: &Announcement) -> Result<()>;
}

/// Build the outbound message for an announcement.
pub fn build_message(announcement: &Announcement, source_url: &str) -> String {
    let prefix = if announcement.body.is_empty() {
        format!("{HEADER}\n{}\n{}", announcement.title, announcement.date)
    } else {
        format!("{HEADER}\n{}\n{}\n\n", announcement.title, announcement.date)
    };
    let suffix = format!("\n\n{source_url}");

    compose(&prefix, &announcement.body, &suffix)
}

/// Fit prefix + body + suffix under [`MESSAGE_LIMIT`].
fn compose(prefix: &str, body: &str, suffix: &str) -> String {
    let prefix_len = unit_len(prefix);
    let suffix_len = unit_len(suffix);

    if prefix_len + suffix_len >= MESSAGE_LIMIT {
        // The prefix carries the title, the single most important field;
        // the suffix gives way instead.
        let keep = MESSAGE_LIMIT.saturating_sub(prefix_len);
        return format!("{prefix}{}", truncate_units(suffix, keep));
    }

    let available = MESSAGE_LIMIT - prefix_len - suffix_len;
    if unit_len(body) <= available {
        return format!("{prefix}{body}{suffix}");
    }

    let marker_len = unit_len(TRUNCATION_MARKER);
    let truncated = if available > marker_len {
        format!(
            "{}{}",
            truncate_units(body, available - marker_len),
            TRUNCATION_MARKER
        )
    } else {
        truncate_units(body, available)
    };
    format!("{prefix}{truncated}{suffix}")
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Notifier backed by the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
    source_url: String,
}

impl TelegramNotifier {
    /// Create a notifier from delivery settings and the announcement page
    /// URL (included in every message as the source link).
    pub fn new(
        client: reqwest::Client,
        telegram: &TelegramConfig,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: telegram.api_base.trim_end_matches('/').to_string(),
            token: telegram.token.clone(),
            chat_id: telegram.chat_id.clone(),
            source_url: source_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, announcement: &Announcement) -> Result<()> {
        let text = build_message(announcement, &self.source_url);

        let response = self
            .client
            .post(self.endpoint())
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text: &text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(
                status.as_u16(),
                truncate_units(&body, 200),
            ));
        }

        log::info!("Notification delivered ({} text units)", unit_len(&text));
        Ok(())
    }
}
