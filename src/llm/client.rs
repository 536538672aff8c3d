//! Chat-completions client for OpenAI-compatible providers

use crate::config::LlmConfig;
use crate::error::{Result, ScorecardError};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Anything that can turn a prompt into a raw reply
pub trait CompletionProvider {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<Completion>> + Send;

    /// Model identifier reported in generated reports
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Client for `POST {api_base}/chat/completions`.
///
/// Rate limits (429), server errors and transport failures are retried with
/// exponential backoff; other client errors fail at once.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    settings: LlmConfig,
    retry_base_delay: Duration,
}

impl OpenAiClient {
    pub fn new(settings: LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ScorecardError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            settings,
            retry_base_delay: Duration::from_secs(1),
        })
    }

    /// First retry waits `delay`, each further retry twice as long
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.api_base.trim_end_matches('/'))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * (1u32 << (attempt.saturating_sub(1)).min(16))
    }

    async fn call(&self, prompt: &str) -> Result<Completion> {
        let request_body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let attempts = self.settings.max_retries.max(1);
        let mut last_error: Option<ScorecardError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ScorecardError::LlmRequest(e.to_string()));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(ScorecardError::LlmRequest(format!(
                    "API error (status {}): {}",
                    status.as_u16(),
                    error_message(&body)
                )));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ScorecardError::LlmRequest(format!(
                    "API error (status {}): {}",
                    status.as_u16(),
                    error_message(&body)
                )));
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| ScorecardError::LlmResponse(format!("Malformed completion response: {}", e)))?;

            let usage = chat.usage;
            if let Some(usage) = usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            let text = chat
                .into_text()
                .ok_or_else(|| ScorecardError::LlmResponse("LLM returned empty content".to_string()))?;

            return Ok(Completion { text, usage });
        }

        Err(last_error.unwrap_or_else(|| {
            ScorecardError::LlmRequest(format!("LLM call failed after {} attempts", attempts))
        }))
    }
}

impl CompletionProvider for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.call(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

/// Provider message from an error body, or the body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client(api_base: &str) -> OpenAiClient {
        let mut settings = Config::default().llm;
        settings.api_base = api_base.to_string();
        OpenAiClient::new(settings, "sk-test".to_string()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base() {
        assert_eq!(client("https://api.openai.com/v1/").endpoint(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(client("http://localhost:8080/v1").endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_backoff_doubles() {
        let client = client("http://localhost").with_retry_base_delay(Duration::from_millis(100));
        assert_eq!(client.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(client.backoff_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage { role: "user", content: "Olá" }],
            temperature: 0.3,
            max_tokens: 2500,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Olá");
        assert_eq!(json["max_tokens"], 2500);
    }

    #[test]
    fn test_response_text() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}], "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}}"#,
        )
        .unwrap();
        assert_eq!(chat.usage.unwrap().total_tokens, 12);
        assert_eq!(chat.into_text().as_deref(), Some("[]"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#), "Invalid API key");
        assert_eq!(error_message(" upstream timeout "), "upstream timeout");
    }
}
