//! User-agent parsing and bot classification with `woothee`.

use woothee::parser::Parser;

use crate::domain::entities::{Classification, RequestMetadata};
use crate::domain::providers::BotClassifier;

/// Browser, OS and device family derived from a user agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentDetails {
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses a user agent into coarse analytics dimensions.
pub fn describe_user_agent(user_agent: &str) -> UserAgentDetails {
    match Parser::new().parse(user_agent) {
        Some(result) => UserAgentDetails {
            browser: known(result.name),
            os: known(result.os),
            device: known(result.category),
        },
        None => UserAgentDetails::default(),
    }
}

/// Treats crawlers and requests without a user agent as bots.
#[derive(Debug, Default, Clone, Copy)]
pub struct WootheeBotClassifier;

impl BotClassifier for WootheeBotClassifier {
    fn classify(&self, metadata: &RequestMetadata) -> Classification {
        let Some(ua) = metadata.user_agent.as_deref().map(str::trim) else {
            return Classification::Bot;
        };

        if ua.is_empty() {
            return Classification::Bot;
        }

        match Parser::new().parse(ua) {
            Some(result) if result.category == "crawler" => Classification::Bot,
            _ => Classification::Human,
        }
    }
}
