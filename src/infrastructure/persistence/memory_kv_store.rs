//! In-process implementation of the key-value store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::repositories::{KeyPage, KvStore, PutCondition, PutOptions, PutOutcome};
use crate::error::StoreError;

/// Expired entries are swept on every this many writes.
const PRUNE_EVERY_WRITES: usize = 128;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|e| e > now)
    }
}

/// Ordered in-memory store.
///
/// Every write holds the map's write lock for the whole check-and-set, which
/// makes conditional writes atomic. Used when no database is configured and
/// throughout the test suite.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<String, Entry>>,
    writes: AtomicUsize,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, including expired ones not yet pruned.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Utc::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        options: PutOptions,
    ) -> Result<PutOutcome, StoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let live = entries.get(key).is_some_and(|e| e.is_live(now));

        let allowed = match options.condition {
            PutCondition::Always => true,
            PutCondition::IfAbsent => !live,
            PutCondition::IfPresent => live,
        };

        if !allowed {
            return Ok(PutOutcome::ConditionFailed);
        }

        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: options.expires_at,
            },
        );

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % PRUNE_EVERY_WRITES == 0 {
            entries.retain(|_, e| e.is_live(now));
        }
        Ok(PutOutcome::Written)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        Ok(self
            .entries
            .write()
            .remove(key)
            .is_some_and(|e| e.is_live(now)))
    }

    async fn list_keys_by_prefix(
        &self,
        prefix: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<KeyPage, StoreError> {
        if limit == 0 {
            return Ok(KeyPage::default());
        }

        let now = Utc::now();
        let entries = self.entries.read();

        let start = match cursor.as_deref() {
            Some(c) if c >= prefix => Bound::Excluded(c),
            _ => Bound::Included(prefix),
        };

        let mut keys: Vec<String> = entries
            .range::<str, _>((start, Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .take(limit + 1)
            .collect();

        let cursor = if keys.len() > limit {
            keys.truncate(limit);
            keys.last().cloned()
        } else {
            None
        };

        Ok(KeyPage { keys, cursor })
    }

    async fn health_check(&self) -> bool {
        true
    }
}
