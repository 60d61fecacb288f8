//! Implementations of the non-storage collaborators.
//!
//! - [`WorkersAiClient`] / [`DisabledCompletion`] - Completion providers
//! - [`WootheeBotClassifier`] - User-agent based bot classification

pub mod woothee_classifier;
pub mod workers_ai;

pub use woothee_classifier::{UserAgentDetails, WootheeBotClassifier, describe_user_agent};
pub use workers_ai::{DisabledCompletion, WorkersAiClient};
