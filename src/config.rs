// src/config.rs

//! Application configuration structures.

use std::env;
use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fetching and state persistence settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Markup profiles tried in order against the fetched page
    #[serde(default = "defaults::markup_profiles")]
    pub markup: Vec<MarkupProfile>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override secrets from the process environment.
    ///
    /// `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID` take precedence over any
    /// values in the config file, so credentials never need to live on disk.
    pub fn apply_env(&mut self) {
        if let Ok(token) = env::var("TELEGRAM_TOKEN") {
            self.telegram.token = token;
        }
        if let Ok(chat_id) = env::var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.url.trim().is_empty() {
            return Err(AppError::config("watcher.url is empty"));
        }
        url::Url::parse(&self.watcher.url)
            .map_err(|e| AppError::config(format!("watcher.url invalid: {e}")))?;
        if self.watcher.user_agent.trim().is_empty() {
            return Err(AppError::config("watcher.user_agent is empty"));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::config("watcher.timeout_secs must be > 0"));
        }
        if self.watcher.state_file.trim().is_empty() {
            return Err(AppError::config("watcher.state_file is empty"));
        }
        if self.telegram.token.trim().is_empty() {
            return Err(AppError::config(
                "telegram.token is empty (set TELEGRAM_TOKEN)",
            ));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(AppError::config(
                "telegram.chat_id is empty (set TELEGRAM_CHAT_ID)",
            ));
        }
        if self.markup.is_empty() {
            return Err(AppError::config("No markup profiles defined"));
        }
        for profile in &self.markup {
            profile.validate()?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watcher: WatcherConfig::default(),
            telegram: TelegramConfig::default(),
            markup: defaults::markup_profiles(),
        }
    }
}

/// Fetching and state persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// URL of the announcement listing page
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (applies to fetch and delivery)
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Path of the last-seen state file
    #[serde(default = "defaults::state_file")]
    pub state_file: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            state_file: defaults::state_file(),
        }
    }
}

/// Telegram Bot API delivery settings.
///
/// Token and chat id are secrets; they normally arrive through the
/// environment (see [`Config::apply_env`]) rather than the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Base URL of the Bot API (overridable for tests)
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token
    #[serde(default)]
    pub token: String,

    /// Destination chat identifier
    #[serde(default)]
    pub chat_id: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            token: String::new(),
            chat_id: String::new(),
        }
    }
}

/// One set of CSS selectors describing a page layout variant.
///
/// The news page markup has changed several times (container class names,
/// nesting depth), so the selectors are configuration, not code. Profiles
/// are tried in order; the first one that yields a titled container wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupProfile {
    /// Profile name for identification
    pub name: String,

    /// CSS selector for announcement containers, in document order
    pub container_selector: String,

    /// CSS selector for the title element within a container
    pub title_selector: String,

    /// CSS selector for the date element within a container
    pub date_selector: String,

    /// CSS selector for body paragraphs within a container
    pub body_selector: String,
}

impl MarkupProfile {
    /// Check that every selector in the profile parses.
    pub fn validate(&self) -> Result<()> {
        for sel in [
            &self.container_selector,
            &self.title_selector,
            &self.date_selector,
            &self.body_selector,
        ] {
            Selector::parse(sel).map_err(|e| AppError::selector(sel, format!("{e:?}")))?;
        }
        Ok(())
    }
}

mod defaults {
    use super::MarkupProfile;

    // Watcher defaults
    pub fn url() -> String {
        "https://it.tlscontact.com/by/msq/page.php?pid=news".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; slotwatch/1.0)".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn state_file() -> String {
        "last_seen.txt".into()
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }

    // Markup profile defaults
    pub fn markup_profiles() -> Vec<MarkupProfile> {
        vec![
            MarkupProfile {
                name: "tls_news_item".to_string(),
                container_selector: "div.news-item".to_string(),
                title_selector: "h3".to_string(),
                date_selector: "p strong u".to_string(),
                body_selector: "p".to_string(),
            },
            MarkupProfile {
                name: "tls_card".to_string(),
                container_selector: "div.card-body".to_string(),
                title_selector: "h3.mb-0".to_string(),
                date_selector: "p strong u".to_string(),
                body_selector: "p".to_string(),
            },
            // Whole-page fallback: treats the document body as the single
            // container, matching the oldest observed layout where headings
            // sat directly in the page flow.
            MarkupProfile {
                name: "bare_headings".to_string(),
                container_selector: "body".to_string(),
                title_selector: "h3".to_string(),
                date_selector: "strong u, b u".to_string(),
                body_selector: "p".to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        config.telegram.chat_id = "42".to_string();
        config
    }

    #[test]
    fn validate_config_with_credentials_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_token() {
        let mut config = valid_config();
        config.telegram.token = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_chat_id() {
        let mut config = valid_config();
        config.telegram.chat_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unparseable_url() {
        let mut config = valid_config();
        config.watcher.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.watcher.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = valid_config();
        config.markup[0].container_selector = "[[invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_profiles_parse() {
        for profile in defaults::markup_profiles() {
            assert!(profile.validate().is_ok(), "profile {}", profile.name);
        }
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watcher]
            url = "https://example.com/news"
            "#,
        )
        .unwrap();
        assert_eq!(config.watcher.url, "https://example.com/news");
        assert_eq!(config.watcher.timeout_secs, 15);
        assert!(!config.markup.is_empty());
    }
}
