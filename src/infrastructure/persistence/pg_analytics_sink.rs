//! PostgreSQL implementation of the analytics sink.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::AnalyticsEvent;
use crate::domain::repositories::AnalyticsSink;
use crate::error::SinkError;
use crate::infrastructure::providers::describe_user_agent;

/// Writes click events into `link_clicks`, one multi-row insert per batch.
///
/// Browser, OS and device are derived from the user agent at write time so
/// the request path never parses user agents beyond bot classification.
pub struct PgAnalyticsSink {
    pool: Arc<PgPool>,
}

impl PgAnalyticsSink {
    /// Creates a new sink with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsSink for PgAnalyticsSink {
    async fn write(&self, events: &[AnalyticsEvent]) -> Result<(), SinkError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO link_clicks \
             (slug, url, clicked_at, referrer, user_agent, is_bot, ip, country, asn, browser, os, device) ",
        );

        builder.push_values(events, |mut row, event| {
            let details = event
                .user_agent
                .as_deref()
                .map(describe_user_agent)
                .unwrap_or_default();

            row.push_bind(&event.slug)
                .push_bind(&event.url)
                .push_bind(event.timestamp)
                .push_bind(&event.referrer)
                .push_bind(&event.user_agent)
                .push_bind(event.is_bot)
                .push_bind(&event.ip)
                .push_bind(&event.country)
                .push_bind(&event.asn)
                .push_bind(details.browser)
                .push_bind(details.os)
                .push_bind(details.device);
        });

        builder.build().execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
