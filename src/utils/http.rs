// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::config::WatcherConfig;
use crate::error::Result;

/// Create a configured asynchronous HTTP client.
///
/// The timeout applies to every request made through the client, both the
/// page fetch and the notification delivery.
pub fn create_client(config: &WatcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page and return its text. Non-2xx responses are errors.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(text)
}
