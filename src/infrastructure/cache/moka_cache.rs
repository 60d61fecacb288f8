//! In-process cache backed by `moka`.

use super::service::{CacheLookup, CacheResult, LinkCache, is_fresh};
use crate::config::CacheSettings;
use crate::domain::entities::{LinkRecord, TrustLevel};
use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedEntry {
    /// `None` marks a negative entry.
    record: Option<LinkRecord>,
    ttl: Duration,
    inserted_at: Instant,
}

/// Evicts each entry after the TTL it was written with. Overwrites restart
/// the clock.
struct EntryExpiry;

impl Expiry<String, CachedEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process cache with per-entry TTL.
///
/// Eviction bounds memory; correctness relies on the freshness check in
/// [`LinkCache::lookup`], which also applies the reading caller's TTL class.
pub struct MokaLinkCache {
    inner: Cache<String, CachedEntry>,
    settings: CacheSettings,
}

impl MokaLinkCache {
    pub fn new(settings: CacheSettings) -> Self {
        let inner = Cache::builder()
            .max_capacity(settings.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        debug!(
            "MokaLinkCache initialized with max capacity: {}, TTLs: {:?}/{:?}/{:?}",
            settings.max_capacity,
            settings.standard_ttl,
            settings.preview_ttl,
            settings.negative_ttl
        );

        Self { inner, settings }
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn lookup(&self, slug: &str, trust: TrustLevel) -> CacheResult<CacheLookup> {
        let Some(entry) = self.inner.get(slug).await else {
            return Ok(CacheLookup::Miss);
        };

        if !is_fresh(
            entry.inserted_at.elapsed(),
            entry.ttl,
            self.settings.ttl_for(trust),
        ) {
            debug!("Cache STALE for {:?}: {}", trust, slug);
            return Ok(CacheLookup::Miss);
        }

        Ok(match entry.record {
            Some(record) => CacheLookup::Hit(record),
            None => CacheLookup::NegativeHit,
        })
    }

    async fn store(
        &self,
        slug: &str,
        record: &LinkRecord,
        trust: TrustLevel,
    ) -> CacheResult<()> {
        let entry = CachedEntry {
            record: Some(record.clone()),
            ttl: self.settings.ttl_for(trust),
            inserted_at: Instant::now(),
        };
        self.inner.insert(slug.to_string(), entry).await;
        Ok(())
    }

    async fn store_absent(&self, slug: &str) -> CacheResult<()> {
        let entry = CachedEntry {
            record: None,
            ttl: self.settings.negative_ttl,
            inserted_at: Instant::now(),
        };
        self.inner.insert(slug.to_string(), entry).await;
        Ok(())
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        self.inner.invalidate(slug).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
