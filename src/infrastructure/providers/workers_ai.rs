//! Text completion over a Workers AI compatible HTTP endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::providers::CompletionProvider;
use crate::error::CompletionError;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct RunResponse {
    result: Option<RunResult>,
}

#[derive(Deserialize)]
struct RunResult {
    response: Option<String>,
}

/// Calls `POST {endpoint}/{model}` with a bearer token and returns
/// `result.response` verbatim.
///
/// The caller owns the overall deadline; the client timeout here only bounds
/// a single hung connection.
pub struct WorkersAiClient {
    http: reqwest::Client,
    run_url: String,
    api_token: String,
}

impl WorkersAiClient {
    /// Builds a client for one model.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Request`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_token: String,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slug-engine/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            run_url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            api_token,
        })
    }
}

#[async_trait]
impl CompletionProvider for WorkersAiClient {
    async fn complete(&self, system_prompt: &str, input: &str) -> Result<String, CompletionError> {
        let body = RunRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
        };

        let response = self
            .http
            .post(&self.run_url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Status(status.as_u16()));
        }

        let payload: RunResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let text = payload
            .result
            .and_then(|r| r.response)
            .ok_or_else(|| CompletionError::Malformed("missing result.response".to_string()))?;

        debug!("Completion returned {} bytes", text.len());
        Ok(text)
    }
}

/// Provider used when no completion backend is configured.
pub struct DisabledCompletion;

#[async_trait]
impl CompletionProvider for DisabledCompletion {
    async fn complete(&self, _system_prompt: &str, _input: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_url_joins_endpoint_and_model() {
        let client = WorkersAiClient::new(
            "https://api.example.com/ai/run/",
            "@cf/meta/llama-3.1-8b-instruct",
            "token".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            client.run_url,
            "https://api.example.com/ai/run/@cf/meta/llama-3.1-8b-instruct"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = RunRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: "prompt",
                },
                ChatMessage {
                    role: "user",
                    content: "https://example.com",
                },
            ],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "https://example.com");
    }

    #[tokio::test]
    async fn test_disabled_completion_errors() {
        let result = DisabledCompletion.complete("p", "u").await;
        assert!(matches!(result, Err(CompletionError::Disabled)));
    }
}
