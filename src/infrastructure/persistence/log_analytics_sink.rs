//! Analytics sink that emits events as structured log lines.

use async_trait::async_trait;
use tracing::info;

use crate::domain::entities::AnalyticsEvent;
use crate::domain::repositories::AnalyticsSink;
use crate::error::SinkError;

/// Logs every event under the `analytics` target.
///
/// Used when no database is configured. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnalyticsSink;

#[async_trait]
impl AnalyticsSink for LogAnalyticsSink {
    async fn write(&self, events: &[AnalyticsEvent]) -> Result<(), SinkError> {
        for event in events {
            info!(
                target: "analytics",
                slug = %event.slug,
                url = %event.url,
                timestamp = %event.timestamp,
                referrer = event.referrer.as_deref().unwrap_or("-"),
                user_agent = event.user_agent.as_deref().unwrap_or("-"),
                is_bot = event.is_bot,
                ip = event.ip.as_deref().unwrap_or("-"),
                country = event.country.as_deref().unwrap_or("-"),
                asn = event.asn.as_deref().unwrap_or("-"),
                "click"
            );
        }
        Ok(())
    }
}
