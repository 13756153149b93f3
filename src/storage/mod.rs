//! # Storage Module - Topic Table Persistence
//!
//! The topic table maps a topic name to a destination thread id and an ordered
//! keyword list. It lives in memory and is backed by a single pretty-printed
//! JSON file that operators are expected to hand-edit:
//!
//! ```json
//! {
//!   "gift": {
//!     "thread_id": 42,
//!     "keywords": ["promo", "sale"]
//!   }
//! }
//! ```
//!
//! The table is loaded wholesale at startup and on explicit reload. A load
//! failure never clobbers the in-memory table: the previous table stays
//! authoritative and the failure is reported to the caller for logging. After
//! every keyword mutation the caller saves and immediately reloads, so a silent
//! write failure shows up as stale data on the very next read instead of
//! drifting unnoticed.
//!
//! Topics iterate in `BTreeMap` order, which keeps routing deterministic and
//! makes a save/load round-trip reproduce the same table.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::relay::errors::RelayError;

/// A routing target: one forum thread plus the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Destination thread identifier within the destination group.
    pub thread_id: i64,
    /// Ordered, case-insensitively matched keyword list. May be empty.
    pub keywords: Vec<String>,
}

/// In-memory topic table with JSON-file persistence.
#[derive(Debug)]
pub struct TopicStore {
    path: PathBuf,
    topics: BTreeMap<String, Topic>,
    last_reload: Option<DateTime<Utc>>,
}

impl TopicStore {
    /// Create an empty store backed by `path`. Nothing is read yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        TopicStore {
            path: path.as_ref().to_path_buf(),
            topics: BTreeMap::new(),
            last_reload: None,
        }
    }

    /// Read and parse the backing file, replacing the in-memory table.
    ///
    /// On any read or parse failure the existing table is left untouched and a
    /// [`RelayError::RecordLoad`] is returned for the caller to log.
    pub async fn load(&mut self) -> Result<(), RelayError> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            RelayError::RecordLoad(format!("{}: {}", self.path.display(), e))
        })?;
        let parsed: BTreeMap<String, Topic> = serde_json::from_str(&content).map_err(|e| {
            RelayError::RecordLoad(format!("{}: {}", self.path.display(), e))
        })?;
        self.topics = parsed;
        self.last_reload = Some(Utc::now());
        debug!(
            "topic table loaded from {} ({} topics)",
            self.path.display(),
            self.topics.len()
        );
        Ok(())
    }

    /// Serialize the in-memory table to the backing file, overwriting it.
    ///
    /// On failure the in-memory table remains authoritative.
    pub async fn save(&self) -> Result<(), RelayError> {
        let content = serde_json::to_string_pretty(&self.topics).map_err(|e| {
            RelayError::RecordSave(format!("{}: {}", self.path.display(), e))
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    RelayError::RecordSave(format!("{}: {}", parent.display(), e))
                })?;
            }
        }
        fs::write(&self.path, content).await.map_err(|e| {
            RelayError::RecordSave(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// Append a keyword to an existing topic.
    pub fn add_keyword(&mut self, topic: &str, keyword: &str) -> Result<(), RelayError> {
        let entry = self
            .topics
            .get_mut(topic)
            .ok_or_else(|| RelayError::TopicNotFound(topic.to_string()))?;
        entry.keywords.push(keyword.to_string());
        Ok(())
    }

    /// Remove a keyword from an existing topic. Removing an absent keyword is
    /// a no-op, not an error.
    pub fn remove_keyword(&mut self, topic: &str, keyword: &str) -> Result<(), RelayError> {
        let entry = self
            .topics
            .get_mut(topic)
            .ok_or_else(|| RelayError::TopicNotFound(topic.to_string()))?;
        entry.keywords.retain(|k| k != keyword);
        Ok(())
    }

    /// Insert or replace a whole topic. Used by `init` and tests.
    pub fn insert_topic(&mut self, name: &str, topic: Topic) {
        self.topics.insert(name.to_string(), topic);
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    pub fn topics(&self) -> &BTreeMap<String, Topic> {
        &self.topics
    }

    /// Topic names in table order, for the edit-flow prompts.
    pub fn topic_names(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    /// (topic count, total keyword count across all topics)
    pub fn stats(&self) -> (usize, usize) {
        let keywords = self.topics.values().map(|t| t.keywords.len()).sum();
        (self.topics.len(), keywords)
    }

    pub fn last_reload(&self) -> Option<DateTime<Utc>> {
        self.last_reload
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
