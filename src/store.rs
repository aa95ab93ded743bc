//! In-memory mapping table owned by the shortener service.
//!
//! The table is plain data: every method is synchronous and the caller
//! decides how it is shared. `ShortenerService` keeps it behind a single
//! `RwLock` so that lookup, code generation and insert happen atomically.

use crate::error::{AppError, AppResult};
use crate::models::LinkRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredLink {
    seq: u64,
    record: LinkRecord,
}

/// Short code → record table with a canonical long URL index.
#[derive(Debug, Default)]
pub struct LinkTable {
    by_code: HashMap<String, StoredLink>,
    /// long URL → canonical short code
    canonical: HashMap<String, String>,
    /// deleted short code → time it may be reissued
    quarantine: HashMap<String, DateTime<Utc>>,
    next_seq: u64,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by short code
    pub fn get(&self, short_code: &str) -> Option<&LinkRecord> {
        self.by_code.get(short_code).map(|stored| &stored.record)
    }

    /// Get the canonical record for a normalized long URL
    pub fn find_by_url(&self, long_url: &str) -> Option<&LinkRecord> {
        self.canonical
            .get(long_url)
            .and_then(|code| self.get(code))
    }

    /// A code is taken while it is active or quarantined.
    pub fn is_taken(&self, short_code: &str) -> bool {
        self.by_code.contains_key(short_code) || self.quarantine.contains_key(short_code)
    }

    /// Insert a new record. The first record for a long URL becomes its
    /// canonical mapping.
    pub fn insert(&mut self, record: LinkRecord) -> AppResult<()> {
        if self.is_taken(&record.short_code) {
            return Err(AppError::Internal(format!(
                "short code {} is already in use",
                record.short_code
            )));
        }

        self.canonical
            .entry(record.long_url.clone())
            .or_insert_with(|| record.short_code.clone());

        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_code
            .insert(record.short_code.clone(), StoredLink { seq, record });

        Ok(())
    }

    /// Remove a record and quarantine its code until `release_at`.
    pub fn remove(&mut self, short_code: &str, release_at: DateTime<Utc>) -> Option<LinkRecord> {
        let stored = self.by_code.remove(short_code)?;

        if self.canonical.get(&stored.record.long_url).map(String::as_str) == Some(short_code) {
            self.canonical.remove(&stored.record.long_url);
        }

        self.quarantine.insert(short_code.to_string(), release_at);
        Some(stored.record)
    }

    /// Drop quarantine entries whose release time has passed.
    pub fn release_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.quarantine.len();
        self.quarantine.retain(|_, release_at| *release_at > now);
        before - self.quarantine.len()
    }

    /// Newest-first records, at most `limit` of them.
    pub fn recent(&self, limit: usize) -> Vec<LinkRecord> {
        let mut links: Vec<&StoredLink> = self.by_code.values().collect();
        links.sort_by(|a, b| b.seq.cmp(&a.seq));
        links
            .into_iter()
            .take(limit)
            .map(|stored| stored.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn quarantined(&self) -> usize {
        self.quarantine.len()
    }
}
