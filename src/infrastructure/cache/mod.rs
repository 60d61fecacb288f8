//! Caching layer for fast redirect lookups.
//!
//! Provides a [`LinkCache`] trait with two implementations:
//! - [`MokaLinkCache`] - In-process cache, used when Redis is not configured
//! - [`RedisLinkCache`] - Shared Redis-backed cache

mod moka_cache;
mod redis_cache;
mod service;

pub use moka_cache::MokaLinkCache;
pub use redis_cache::RedisLinkCache;
pub use service::{CacheError, CacheLookup, CacheResult, LinkCache, is_fresh};

#[cfg(test)]
pub use service::MockLinkCache;
