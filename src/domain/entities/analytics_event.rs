//! Click event model for asynchronous analytics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::request::{Classification, RequestMetadata};

/// A single resolved redirect, handed to the analytics recorder.
///
/// Produced once per served redirect and never mutated afterwards; ownership
/// moves into the recorder's queue, which owns delivery from then on.
///
/// # Usage Flow
///
/// 1. Built by [`crate::application::services::RedirectResolver`] after a successful lookup
/// 2. Enqueued with [`crate::application::services::AnalyticsRecorder::record`] (non-blocking)
/// 3. Batched and written by the recorder's background worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub slug: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub is_bot: bool,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub asn: Option<String>,
}

impl AnalyticsEvent {
    /// Creates an event from the resolved link and the request metadata.
    pub fn new(
        slug: String,
        url: String,
        metadata: RequestMetadata,
        classification: Classification,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            slug,
            url,
            timestamp,
            referrer: metadata.referrer,
            user_agent: metadata.user_agent,
            is_bot: classification.is_bot(),
            ip: metadata.ip,
            country: metadata.country,
            asn: metadata.asn,
        }
    }
}
