// src/storage/state.rs

//! Last-seen state persistence.
//!
//! Exactly one record is ever retained: the identity of the last
//! announcement that was successfully notified, stored as a single
//! `title|date` line. The file is overwritten whole on every save and is
//! absent before the first successful notification.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Identity;

/// Field separator in the persisted record.
///
/// A pipe in the title corrupts the split (the first pipe wins); fields
/// are not escaped.
const DELIMITER: char = '|';

/// File-backed store for the last notified identity.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored identity.
    ///
    /// Never fails: a missing, unreadable, or malformed file all mean "no
    /// prior announcement known" and yield the empty identity.
    pub async fn load(&self) -> Identity {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Identity::empty(),
            Err(e) => {
                log::warn!("State file {:?} unreadable: {}", self.path, e);
                return Identity::empty();
            }
        };

        match content.trim().split_once(DELIMITER) {
            Some((title, date)) => Identity {
                title: title.trim().to_string(),
                date: date.trim().to_string(),
            },
            None => {
                if !content.trim().is_empty() {
                    log::warn!("State file {:?} malformed, treating as empty", self.path);
                }
                Identity::empty()
            }
        }
    }

    /// Persist the identity, replacing any previous record.
    ///
    /// Write goes to a temp file first and is renamed over the target, so
    /// a crash mid-write leaves the old record intact. Callers invoke this
    /// only after confirmed delivery.
    pub async fn save(&self, identity: &Identity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let line = format!("{}{}{}", identity.title, DELIMITER, identity.date);

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
