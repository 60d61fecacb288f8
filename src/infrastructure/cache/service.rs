//! Cache service trait and error types.

use crate::domain::entities::{LinkRecord, TrustLevel};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// A fresh record for the caller's TTL class.
    Hit(LinkRecord),
    /// Nothing usable cached; consult the store.
    Miss,
    /// The store recently reported the slug absent.
    NegativeHit,
}

impl CacheLookup {
    /// Label used for the `cache_lookups_total` metric.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Hit(_) => "hit",
            Self::Miss => "miss",
            Self::NegativeHit => "negative",
        }
    }
}

/// An entry is usable while it is younger than both the TTL it was written
/// with and the TTL of the class now reading it.
pub fn is_fresh(age: Duration, entry_ttl: Duration, class_ttl: Duration) -> bool {
    age < entry_ttl.min(class_ttl)
}

/// Trait for caching slug resolutions.
///
/// Implementations must be thread-safe and handle errors gracefully without
/// disrupting the application (cache failures degrade to store lookups).
/// Keys are normalized slugs.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::MokaLinkCache`] - In-process cache
/// - [`crate::infrastructure::cache::RedisLinkCache`] - Redis-backed shared cache
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Looks up a slug on behalf of a caller of the given trust class.
    ///
    /// # Returns
    ///
    /// - `Ok(CacheLookup::Hit(record))` if an entry is fresh for `trust`
    /// - `Ok(CacheLookup::NegativeHit)` if a fresh absence marker exists
    /// - `Ok(CacheLookup::Miss)` otherwise, including on backend errors
    async fn lookup(&self, slug: &str, trust: TrustLevel) -> CacheResult<CacheLookup>;

    /// Caches a record with the TTL of the caller's class.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers.
    async fn store(&self, slug: &str, record: &LinkRecord, trust: TrustLevel)
    -> CacheResult<()>;

    /// Caches the absence of a slug with the negative TTL.
    async fn store_absent(&self, slug: &str) -> CacheResult<()>;

    /// Removes any cached entry, positive or negative.
    ///
    /// Used when a link is created, modified, deleted or found expired.
    ///
    /// # Errors
    ///
    /// Unlike the other writes, a failed removal is reported: a mutation
    /// must not succeed while the previous entry may still be served.
    async fn invalidate(&self, slug: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
