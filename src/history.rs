//! Bounded, newest-first log of recent conversions.
//!
//! `push` and `evict` are pure functions over entry slices; [`History`]
//! wraps them for callers that want a value to pass around. The log is
//! persisted as one JSON array under a single key of a [`HistoryStore`].

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 10;

/// One conversion as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Millisecond timestamp of the conversion, used as a display id
    pub id: i64,
    pub original: String,
    pub short: String,
    pub created_at: DateTime<Utc>,
    /// Generated locally while the API was unavailable; the link does not resolve
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl HistoryEntry {
    pub fn new(original: impl Into<String>, short: impl Into<String>) -> Self {
        let created_at = Utc::now();
        Self {
            id: created_at.timestamp_millis(),
            original: original.into(),
            short: short.into(),
            created_at,
            fallback: false,
        }
    }

    /// Entry for a link that was substituted locally.
    pub fn local_fallback(original: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::new(original, short)
        }
    }
}

/// Prepend `entry` and keep at most `capacity` entries.
pub fn push(entries: &[HistoryEntry], entry: HistoryEntry, capacity: usize) -> Vec<HistoryEntry> {
    std::iter::once(entry)
        .chain(entries.iter().cloned())
        .take(capacity)
        .collect()
}

/// Keep the newest `capacity` entries.
pub fn evict(entries: &[HistoryEntry], capacity: usize) -> Vec<HistoryEntry> {
    entries.iter().take(capacity).cloned().collect()
}

/// Bounded history value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Build from stored entries, trimming anything past `capacity`.
    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        Self {
            entries: evict(&entries, capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries = push(&self.entries, entry, self.capacity);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// JSON-file key-value store, one document holding every key.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<Map<String, Value>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Map::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, document: &Map<String, Value>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(document)?)?;
        Ok(())
    }

    /// Read the value stored under `key`
    pub fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    /// Store `value` under `key`, keeping the other keys
    pub fn set(&self, key: &str, value: Value) -> AppResult<()> {
        let mut document = self.read_all()?;
        document.insert(key.to_string(), value);
        self.write_all(&document)
    }

    /// Remove `key`; returns whether it was present
    pub fn remove(&self, key: &str) -> AppResult<bool> {
        let mut document = self.read_all()?;
        let existed = document.remove(key).is_some();
        if existed {
            self.write_all(&document)?;
        }
        Ok(existed)
    }

    /// Load the history under `key`. Unreadable or malformed data is logged
    /// and treated as an empty history.
    pub fn load_history(&self, key: &str, capacity: usize) -> History {
        let loaded = self.get(key).and_then(|value| match value {
            Some(value) => Ok(serde_json::from_value::<Vec<HistoryEntry>>(value)?),
            None => Ok(Vec::new()),
        });

        match loaded {
            Ok(entries) => History::from_entries(entries, capacity),
            Err(e) => {
                error!(path = %self.path.display(), "Error loading history: {}", e);
                History::new(capacity)
            }
        }
    }

    pub fn save_history(&self, key: &str, history: &History) -> AppResult<()> {
        self.set(key, serde_json::to_value(history.entries())?)?;
        debug!(entries = history.len(), "Saved history");
        Ok(())
    }
}
