//! Bot classification capability.

use crate::domain::entities::{Classification, RequestMetadata};

/// Decides whether a request comes from a human or an automated client.
///
/// Runs synchronously on the request path, so implementations must not do I/O.
#[cfg_attr(test, mockall::automock)]
pub trait BotClassifier: Send + Sync {
    fn classify(&self, metadata: &RequestMetadata) -> Classification;
}
