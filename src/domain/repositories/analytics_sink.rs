//! Analytics sink capability.

use crate::domain::entities::AnalyticsEvent;
use crate::error::SinkError;
use async_trait::async_trait;

/// Destination for click analytics.
///
/// Called only from the analytics recorder's background worker, never from the
/// request path. A batch is either written entirely or reported as failed; the
/// recorder decides whether to retry.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsSink`] - Batch insert into `link_clicks`
/// - [`crate::infrastructure::persistence::LogAnalyticsSink`] - Structured log line per event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn write(&self, events: &[AnalyticsEvent]) -> Result<(), SinkError>;
}
