//! In-memory Record Cache
//!
//! Lock-free concurrent map with per-entry expiry. Entries are immutable
//! once written; concurrent writers for the same fingerprint converge on
//! last-write-wins, which is acceptable because record shape is idempotent
//! per fingerprint.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::RecordCache;
use crate::types::GeneratedRecord;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, StoredEntry>,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    record: GeneratedRecord,
    expires_at: Instant,
}

impl StoredEntry {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecordCache for MemoryCache {
    fn get(&self, key: &str) -> Option<GeneratedRecord> {
        {
            let entry = self.entries.get(key)?;
            if !entry.expired() {
                return Some(entry.record.clone());
            }
            // Guard must drop before the eviction below.
        }
        self.entries.remove(key);
        None
    }

    fn put(&self, key: &str, record: &GeneratedRecord, ttl: Duration) {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(u32::MAX as u64));
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                record: record.clone(),
                expires_at,
            },
        );
    }

    fn has(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.expired())
    }
}
