//! Redis-backed cache implementation.

use super::service::{CacheError, CacheLookup, CacheResult, LinkCache, is_fresh};
use crate::config::CacheSettings;
use crate::domain::entities::{LinkRecord, TrustLevel};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Value stored under each cache key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedEntry {
    /// `None` marks a negative entry.
    record: Option<LinkRecord>,
    inserted_at_ms: i64,
    ttl_ms: u64,
}

/// Redis cache shared between instances.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisLinkCache {
    client: ConnectionManager,
    settings: CacheSettings,
    key_prefix: String,
}

impl RedisLinkCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, settings: CacheSettings) -> CacheResult<Self> {
        info!("Connecting to Redis cache");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            settings,
            key_prefix: "cache:link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, slug: &str) -> String {
        format!("{}{}", self.key_prefix, slug)
    }

    async fn write(&self, slug: &str, record: Option<LinkRecord>, ttl: Duration) {
        let key = self.build_key(slug);
        let entry = CachedEntry {
            record,
            inserted_at_ms: Utc::now().timestamp_millis(),
            ttl_ms: ttl.as_millis() as u64,
        };

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cache entry serialization failed for {}: {}", slug, e);
                return;
            }
        };

        let mut conn = self.client.clone();
        if let Err(e) = conn
            .pset_ex::<_, _, ()>(&key, payload, entry.ttl_ms)
            .await
        {
            warn!("Redis SET error for {}: {}", slug, e);
        }
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn lookup(&self, slug: &str, trust: TrustLevel) -> CacheResult<CacheLookup> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        let raw = match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache MISS: {}", slug);
                return Ok(CacheLookup::Miss);
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", slug, e);
                return Ok(CacheLookup::Miss);
            }
        };

        let entry: CachedEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry for {}: {}", slug, e);
                return Ok(CacheLookup::Miss);
            }
        };

        let age_ms = (Utc::now().timestamp_millis() - entry.inserted_at_ms).max(0) as u64;
        if !is_fresh(
            Duration::from_millis(age_ms),
            Duration::from_millis(entry.ttl_ms),
            self.settings.ttl_for(trust),
        ) {
            debug!("Cache STALE for {:?}: {}", trust, slug);
            return Ok(CacheLookup::Miss);
        }

        Ok(match entry.record {
            Some(record) => {
                debug!("Cache HIT: {} -> {}", slug, record.url);
                CacheLookup::Hit(record)
            }
            None => CacheLookup::NegativeHit,
        })
    }

    async fn store(
        &self,
        slug: &str,
        record: &LinkRecord,
        trust: TrustLevel,
    ) -> CacheResult<()> {
        self.write(slug, Some(record.clone()), self.settings.ttl_for(trust))
            .await;
        Ok(())
    }

    async fn store_absent(&self, slug: &str) -> CacheResult<()> {
        self.write(slug, None, self.settings.negative_ttl).await;
        Ok(())
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", slug);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", slug, e);
                Err(CacheError::OperationError(e.to_string()))
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
