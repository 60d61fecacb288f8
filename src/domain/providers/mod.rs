//! Non-storage collaborator traits.
//!
//! - [`CompletionProvider`] - Language-model completion for assisted slugs
//! - [`BotClassifier`] - Human/bot classification of inbound requests

pub mod bot_classifier;
pub mod completion;

pub use bot_classifier::BotClassifier;
pub use completion::CompletionProvider;

#[cfg(test)]
pub use bot_classifier::MockBotClassifier;
#[cfg(test)]
pub use completion::MockCompletionProvider;
