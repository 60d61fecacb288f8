//! Durable slug to link record mapping over a key-value store.

use std::sync::Arc;
use std::time::Duration;

use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, warn};

use crate::domain::entities::{LinkPatch, LinkRecord};
use crate::domain::repositories::{KvStore, PutOptions, PutOutcome};
use crate::error::StoreError;
use crate::infrastructure::cache::LinkCache;
use crate::utils::slug::SlugPolicy;

/// Key namespace for link records.
pub const LINK_KEY_PREFIX: &str = "link:";

/// Invalidation backoff: 20ms, 40ms, 80ms before jitter.
const INVALIDATE_RETRY_BASE_MS: u64 = 2;
const INVALIDATE_RETRY_FACTOR: u64 = 10;
const INVALIDATE_RETRY_MAX_DELAY: Duration = Duration::from_millis(500);
const INVALIDATE_RETRIES: usize = 3;

/// Result of [`LinkStore::create_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(LinkRecord),
    AlreadyExists,
}

/// One page of [`LinkStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPage {
    pub links: Vec<LinkRecord>,
    pub cursor: Option<String>,
    pub list_complete: bool,
}

/// Link records keyed by normalized slug.
///
/// Every successful mutation invalidates the slug's cache entry before
/// returning, so a resolution that starts after the call returns cannot be
/// served the previous state. If the cache cannot be invalidated after
/// retries, the mutation reports [`StoreError::StaleCache`] even though the
/// store write itself succeeded.
pub struct LinkStore<K: KvStore + ?Sized = dyn KvStore> {
    kv: Arc<K>,
    cache: Arc<dyn LinkCache>,
    policy: Arc<SlugPolicy>,
    list_limit: usize,
}

impl<K: KvStore + ?Sized> LinkStore<K> {
    pub fn new(
        kv: Arc<K>,
        cache: Arc<dyn LinkCache>,
        policy: Arc<SlugPolicy>,
        list_limit: usize,
    ) -> Self {
        Self {
            kv,
            cache,
            policy,
            list_limit,
        }
    }

    pub fn policy(&self) -> &SlugPolicy {
        &self.policy
    }

    fn key(&self, slug: &str) -> String {
        format!("{}{}", LINK_KEY_PREFIX, self.policy.normalize(slug))
    }

    async fn invalidate(&self, slug: &str) -> Result<(), StoreError> {
        let slug = self.policy.normalize(slug);
        let strategy = ExponentialBackoff::from_millis(INVALIDATE_RETRY_BASE_MS)
            .factor(INVALIDATE_RETRY_FACTOR)
            .max_delay(INVALIDATE_RETRY_MAX_DELAY)
            .map(jitter)
            .take(INVALIDATE_RETRIES);

        Retry::spawn(strategy, || self.cache.invalidate(slug.as_ref()))
            .await
            .map_err(|e| {
                error!("Cache invalidation failed for {}: {}", slug, e);
                StoreError::StaleCache(e.to_string())
            })
    }

    /// Reads the live record for a slug.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or the value is corrupt.
    pub async fn get(&self, slug: &str) -> Result<Option<LinkRecord>, StoreError> {
        match self.kv.get(&self.key(slug)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Atomically creates `record` under its slug unless a live record exists.
    ///
    /// `record.slug` must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or the cache entry could
    /// not be invalidated.
    pub async fn create_if_absent(&self, record: LinkRecord) -> Result<CreateOutcome, StoreError> {
        let value = serde_json::to_string(&record)?;
        let outcome = self
            .kv
            .put(
                &self.key(&record.slug),
                value,
                PutOptions::if_absent(record.expires_at),
            )
            .await?;

        match outcome {
            PutOutcome::Written => {
                self.invalidate(&record.slug).await?;
                debug!("Created link {} -> {}", record.slug, record.url);
                Ok(CreateOutcome::Created(record))
            }
            PutOutcome::ConditionFailed => Ok(CreateOutcome::AlreadyExists),
        }
    }

    /// Applies a patch to an existing record.
    ///
    /// Returns `Ok(None)` if the slug does not exist, including when it is
    /// deleted between the read and the conditional write.
    pub async fn update(
        &self,
        slug: &str,
        patch: LinkPatch,
    ) -> Result<Option<LinkRecord>, StoreError> {
        let Some(mut record) = self.get(slug).await? else {
            return Ok(None);
        };

        record.apply(patch, chrono::Utc::now());
        let value = serde_json::to_string(&record)?;

        let outcome = self
            .kv
            .put(&self.key(slug), value, PutOptions::if_present(record.expires_at))
            .await?;

        match outcome {
            PutOutcome::Written => {
                self.invalidate(slug).await?;
                Ok(Some(record))
            }
            PutOutcome::ConditionFailed => Ok(None),
        }
    }

    /// Deletes a record. Returns `Ok(false)` if there was nothing to delete.
    pub async fn delete(&self, slug: &str) -> Result<bool, StoreError> {
        let removed = self.kv.delete(&self.key(slug)).await?;
        self.invalidate(slug).await?;
        Ok(removed)
    }

    /// Lists records in slug order.
    ///
    /// `limit` defaults to, and is clamped to, the configured maximum.
    /// Keys that vanish or fail to decode between listing and reading are
    /// skipped.
    pub async fn list(
        &self,
        cursor: Option<String>,
        limit: Option<usize>,
    ) -> Result<LinkPage, StoreError> {
        let limit = limit
            .unwrap_or(self.list_limit)
            .clamp(1, self.list_limit);

        let page = self
            .kv
            .list_keys_by_prefix(LINK_KEY_PREFIX, cursor, limit)
            .await?;

        let mut links = Vec::with_capacity(page.keys.len());
        for key in &page.keys {
            let Some(raw) = self.kv.get(key).await? else {
                continue;
            };
            match serde_json::from_str::<LinkRecord>(&raw) {
                Ok(record) => links.push(record),
                Err(e) => warn!("Skipping unreadable record {}: {}", key, e),
            }
        }

        Ok(LinkPage {
            links,
            list_complete: page.cursor.is_none(),
            cursor: page.cursor,
        })
    }

    pub async fn health_check(&self) -> bool {
        self.kv.health_check().await
    }
}
