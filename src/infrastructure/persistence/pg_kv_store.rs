//! PostgreSQL implementation of the key-value store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{KeyPage, KvStore, PutCondition, PutOptions, PutOutcome};
use crate::error::StoreError;

/// PostgreSQL-backed key-value store over the `kv_entries` table.
///
/// Conditional writes are single statements, so the database serializes
/// concurrent writers to the same key. Rows past `expires_at` are treated as
/// absent everywhere and overwritten by the next conditional insert.
pub struct PgKvStore {
    pool: Arc<PgPool>,
}

impl PgKvStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn insert_always(
        &self,
        key: &str,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PutOutcome, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(PutOutcome::Written)
    }

    async fn insert_if_absent(
        &self,
        key: &str,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PutOutcome, StoreError> {
        let written: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO kv_entries (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at, updated_at = now()
            WHERE kv_entries.expires_at IS NOT NULL AND kv_entries.expires_at <= now()
            RETURNING key
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(match written {
            Some(_) => PutOutcome::Written,
            None => PutOutcome::ConditionFailed,
        })
    }

    async fn update_if_present(
        &self,
        key: &str,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PutOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE kv_entries
            SET value = $2, expires_at = $3, updated_at = now()
            WHERE key = $1 AND (expires_at IS NULL OR expires_at > now())
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(if result.rows_affected() > 0 {
            PutOutcome::Written
        } else {
            PutOutcome::ConditionFailed
        })
    }
}

/// Escapes `LIKE` metacharacters so a prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar(
            r#"
            SELECT value FROM kv_entries
            WHERE key = $1 AND (expires_at IS NULL OR expires_at > now())
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(value)
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        options: PutOptions,
    ) -> Result<PutOutcome, StoreError> {
        match options.condition {
            PutCondition::Always => self.insert_always(key, value, options.expires_at).await,
            PutCondition::IfAbsent => self.insert_if_absent(key, value, options.expires_at).await,
            PutCondition::IfPresent => {
                self.update_if_present(key, value, options.expires_at)
                    .await
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let live: Option<bool> = sqlx::query_scalar(
            r#"
            DELETE FROM kv_entries WHERE key = $1
            RETURNING (expires_at IS NULL OR expires_at > now())
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(live.unwrap_or(false))
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

        let mut keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT key FROM kv_entries
            WHERE key LIKE $1 ESCAPE '\'
              AND ($2::text IS NULL OR key COLLATE "C" > $2::text COLLATE "C")
              AND (expires_at IS NULL OR expires_at > now())
            ORDER BY key COLLATE "C"
            LIMIT $3
            "#,
        )
        .bind(like_prefix(prefix))
        .bind(cursor)
        .bind(limit as i64 + 1)
        .fetch_all(self.pool.as_ref())
        .await?;

        let cursor = if keys.len() > limit {
            keys.truncate(limit);
            keys.last().cloned()
        } else {
            None
        };

        Ok(KeyPage { keys, cursor })
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
