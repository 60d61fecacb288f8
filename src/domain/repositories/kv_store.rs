//! Key-value store capability used by the link store.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Condition attached to a write.
///
/// Conditional writes are evaluated atomically by the backend; they are the
/// only collision-prevention mechanism for slugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutCondition {
    #[default]
    Always,
    /// Write only if no live (non-expired) value exists for the key.
    IfAbsent,
    /// Write only if a live value exists for the key.
    IfPresent,
}

/// Options for [`KvStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PutOptions {
    pub condition: PutCondition,
    /// Absolute expiration; expired keys behave as absent.
    pub expires_at: Option<DateTime<Utc>>,
}

impl PutOptions {
    pub fn if_absent(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            condition: PutCondition::IfAbsent,
            expires_at,
        }
    }

    pub fn if_present(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            condition: PutCondition::IfPresent,
            expires_at,
        }
    }
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Written,
    ConditionFailed,
}

/// One page of keys from [`KvStore::list_keys_by_prefix`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    pub keys: Vec<String>,
    /// Cursor for the next page; `None` when the listing is complete.
    pub cursor: Option<String>,
}

/// Durable key-value storage with atomic conditional writes.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgKvStore`] - PostgreSQL table
/// - [`crate::infrastructure::persistence::MemoryKvStore`] - In-process ordered map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a live value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, honouring `options.condition` atomically.
    async fn put(
        &self,
        key: &str,
        value: String,
        options: PutOptions,
    ) -> Result<PutOutcome, StoreError>;

    /// Deletes a key. Returns `Ok(true)` if a live value was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Lists live keys with `prefix` in ascending order, strictly after `cursor`.
    async fn list_keys_by_prefix(
        &self,
        prefix: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<KeyPage, StoreError>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}
