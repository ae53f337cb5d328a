// src/pipeline/watch.rs

//! One watch cycle: load state, fetch, extract, compare, notify, save.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pipeline::is_new;
use crate::services::{Notifier, extract};
use crate::storage::StateStore;
use crate::utils::http;

/// Terminal outcome of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fetch succeeded, identity unchanged
    NoChange,
    /// Identity changed, delivery succeeded, state advanced
    Notified,
    /// Fetch failed, no container, or delivery failed; state untouched
    Skipped,
}

/// Orchestrates the change-detection pipeline for one invocation.
pub struct Watcher<N: Notifier> {
    config: Config,
    client: reqwest::Client,
    store: StateStore,
    notifier: N,
}

impl<N: Notifier> Watcher<N> {
    pub fn new(config: Config, client: reqwest::Client, store: StateStore, notifier: N) -> Self {
        Self {
            config,
            client,
            store,
            notifier,
        }
    }

    /// Run one cycle. Never fails: every failure path is logged and maps
    /// to [`Outcome::Skipped`], so a scheduled caller always exits cleanly.
    pub async fn run_once(&self) -> Outcome {
        match self.cycle().await {
            Ok(outcome) => outcome,
            Err(AppError::NoContainer) => {
                log::info!("No announcement container found; nothing to report");
                Outcome::Skipped
            }
            Err(error) => {
                log::warn!("Cycle aborted: {}", error);
                Outcome::Skipped
            }
        }
    }

    /// The linear pass. State is saved only after confirmed delivery, so a
    /// crash or delivery failure leaves the stored identity unadvanced and
    /// the next run retries the same announcement.
    async fn cycle(&self) -> Result<Outcome> {
        let stored = self.store.load().await;

        let html = http::fetch_text(&self.client, &self.config.watcher.url).await?;
        let announcement = extract(&html, &self.config.markup)?;
        let current = announcement.identity();

        if !is_new(&current, &stored) {
            log::debug!("Latest announcement unchanged: {}", current.title);
            return Ok(Outcome::NoChange);
        }

        log::info!("New announcement detected: {} ({})", current.title, current.date);
        self.notifier.send(&announcement).await?;

        if let Err(error) = self.store.save(&current).await {
            // The notification went out but the next run will repeat it; a
            // duplicate beats losing the update.
            log::error!("State save failed after delivery: {}", error);
        }

        Ok(Outcome::Notified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Announcement;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Notifier double that records deliveries and optionally fails.
    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<Announcement>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn sent_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn send(&self, announcement: &Announcement) -> crate::error::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::delivery(502, "bad gateway"));
            }
            self.sent.lock().unwrap().push(announcement.clone());
            Ok(())
        }
    }

    const PAGE: &str = r#"
        <div class="news-item">
          <h3>Visa slots open</h3>
          <p><strong><u>01/01/2030</u></strong></p>
          <p>Details here</p>
        </div>
    "#;

    fn watcher_in(tmp: &TempDir, url: &str, notifier: FakeNotifier) -> Watcher<FakeNotifier> {
        let mut config = Config::default();
        config.watcher.url = url.to_string();
        let store = StateStore::new(tmp.path().join("last_seen.txt"));
        Watcher::new(config, reqwest::Client::new(), store, notifier)
    }

    #[tokio::test]
    async fn test_first_run_notifies_and_persists() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let watcher = watcher_in(&tmp, &server.url(), FakeNotifier::default());

        assert_eq!(watcher.run_once().await, Outcome::Notified);
        assert_eq!(watcher.notifier.sent_count(), 1);

        let stored = watcher.store.load().await;
        assert_eq!(stored.title, "Visa slots open");
        assert_eq!(stored.date, "01/01/2030");

        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_run_is_no_change() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body(PAGE)
            .expect(2)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let watcher = watcher_in(&tmp, &server.url(), FakeNotifier::default());

        assert_eq!(watcher.run_once().await, Outcome::Notified);
        assert_eq!(watcher.run_once().await, Outcome::NoChange);
        assert_eq!(watcher.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_without_state_change() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let watcher = watcher_in(&tmp, &server.url(), FakeNotifier::default());

        assert_eq!(watcher.run_once().await, Outcome::Skipped);
        assert_eq!(watcher.notifier.sent_count(), 0);
        assert!(watcher.store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_container_skips_without_state_change() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><body><div>nothing interesting</div></body></html>")
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let watcher = watcher_in(&tmp, &server.url(), FakeNotifier::default());

        assert_eq!(watcher.run_once().await, Outcome::Skipped);
        assert_eq!(watcher.notifier.sent_count(), 0);
        assert!(watcher.store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_state_for_retry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body(PAGE)
            .expect(2)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();

        let failing = watcher_in(&tmp, &server.url(), FakeNotifier::failing());
        assert_eq!(failing.run_once().await, Outcome::Skipped);
        assert!(failing.store.load().await.is_empty());

        // Same content, working notifier: the announcement is still new.
        let working = watcher_in(&tmp, &server.url(), FakeNotifier::default());
        assert_eq!(working.run_once().await, Outcome::Notified);
        assert_eq!(working.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_title_change_triggers_notification() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("last_seen.txt"));
        store
            .save(&crate::models::Identity {
                title: "Old announcement".to_string(),
                date: "01/01/2030".to_string(),
            })
            .await
            .unwrap();

        let watcher = watcher_in(&tmp, &server.url(), FakeNotifier::default());
        assert_eq!(watcher.run_once().await, Outcome::Notified);

        let sent = watcher.notifier.sent.lock().unwrap();
        assert_eq!(sent[0].title, "Visa slots open");
    }
}
