//! Language-model completion capability.

use crate::error::CompletionError;
use async_trait::async_trait;

/// Text completion service used for assisted slug generation.
///
/// The output is untrusted: callers parse it strictly and validate the result
/// exactly like user input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Completes `input` under the given system prompt and returns raw text.
    async fn complete(&self, system_prompt: &str, input: &str) -> Result<String, CompletionError>;
}
