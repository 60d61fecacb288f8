//! Per-request context consumed by the resolution path.

use serde::{Deserialize, Serialize};

/// How much the resolving caller is trusted; selects the cache TTL class.
///
/// A request is [`TrustLevel::Preview`] only when preview mode is enabled and
/// the caller did not present a valid site token. See
/// [`crate::api::handlers::redirect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    #[default]
    Standard,
    Preview,
}

/// Result of bot classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Human,
    Bot,
}

impl Classification {
    pub fn is_bot(self) -> bool {
        matches!(self, Classification::Bot)
    }
}

/// Client metadata extracted from an inbound request.
///
/// All fields are optional so that missing headers are handled gracefully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub asn: Option<String>,
}
