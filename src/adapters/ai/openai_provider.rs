//! OpenAI Provider - Implementation of AIProvider for OpenAI's chat API.
//!
//! Sends non-streaming chat completions to `/chat/completions`. Every call
//! is a single attempt; failures are classified and reported, never retried.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(Some(api_key))
//!     .with_model("gpt-3.5-turbo")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::ports::{AIError, AIProvider, ChatCompletion, ChatRequest, ChatRole};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication. May be absent; completions then fail
    /// with the distinct configuration error.
    api_key: Option<Secret<String>>,
    /// Model to use (e.g., "gpt-3.5-turbo", "gpt-4-turbo").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            api_key,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Builds provider configuration from the application AI section.
    pub fn from_app_config(ai: &AiConfig) -> Self {
        let key = ai
            .openai_api_key
            .clone()
            .filter(|k| !k.expose_secret().is_empty());
        Self::new(key)
            .with_model(ai.model.clone())
            .with_timeout(ai.timeout())
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key, or the configuration error when absent.
    fn api_key(&self) -> Result<&str, AIError> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .ok_or_else(|| {
                AIError::configuration(
                    "OpenAI API key is not configured. Set DEVX__AI__OPENAI_API_KEY.",
                )
            })
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &ChatRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        // System prompt goes first
        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    ChatRole::System => "system",
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Sends the request, classifying transport failures.
    async fn send_request(&self, request: &ChatRequest) -> Result<Response, AIError> {
        let api_key = self.config.api_key()?;
        let openai_request = self.to_openai_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::RateLimited {
                retry_after_secs: Self::parse_retry_after(&error_body),
            }),
            400 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(msg) = parsed.get("error").and_then(|e| e.get("message")) {
                if let Some(s) = msg.as_str() {
                    // "try again in Xs" pattern
                    if let Some(idx) = s.find("try again in ") {
                        let rest = &s[idx + 13..];
                        if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                            if let Ok(secs) = rest[..num_end].parse::<u32>() {
                                return secs;
                            }
                        }
                    }
                }
            }
        }
        30
    }

    /// Parses a completion response body.
    async fn parse_response(&self, response: Response) -> Result<ChatCompletion, AIError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        // An empty choice list yields empty content; the assistant layer
        // substitutes its fallback text.
        let content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let total_tokens = openai_response
            .usage
            .map(|u| u.total_tokens)
            .unwrap_or_default();

        Ok(ChatCompletion {
            content,
            total_tokens,
            model: openai_response.model,
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, AIError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ChatMessage;

    fn keyed_config() -> OpenAIConfig {
        OpenAIConfig::new(Some(Secret::new("test-key".to_string())))
    }

    #[test]
    fn config_builder_works() {
        let config = keyed_config()
            .with_model("gpt-4-turbo")
            .with_base_url("https://custom.api.com/v1")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "gpt-4-turbo");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key().unwrap(), "test-key");
    }

    #[test]
    fn missing_key_yields_configuration_error() {
        let config = OpenAIConfig::new(None);
        let err = config.api_key().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn from_app_config_filters_empty_key() {
        let ai = AiConfig {
            openai_api_key: Some(Secret::new(String::new())),
            ..Default::default()
        };
        let config = OpenAIConfig::from_app_config(&ai);
        assert!(config.api_key().is_err());
    }

    #[tokio::test]
    async fn complete_without_key_fails_before_any_request() {
        let provider = OpenAIProvider::new(OpenAIConfig::new(None));
        let request = ChatRequest::new(100, 0.7).with_message(ChatRole::User, "Hello");

        let err = provider.complete(request).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn system_prompt_is_first_message() {
        let provider = OpenAIProvider::new(keyed_config());
        let request = ChatRequest::new(100, 0.7)
            .with_system_prompt("Be helpful")
            .with_messages(vec![
                ChatMessage::user("Hi"),
                ChatMessage::assistant("Hello!"),
                ChatMessage::user("Explain traits"),
            ]);

        let wire = provider.to_openai_request(&request);
        assert_eq!(wire.messages.len(), 4);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content, "Be helpful");
        assert_eq!(wire.messages[1].role, "user");
        assert_eq!(wire.messages[2].role, "assistant");
        assert_eq!(wire.messages[3].content, "Explain traits");
    }

    #[test]
    fn wire_request_carries_sampling_parameters() {
        let provider = OpenAIProvider::new(keyed_config().with_model("gpt-3.5-turbo"));
        let request = ChatRequest::new(1000, 0.7).with_message(ChatRole::User, "Hi");

        let wire = provider.to_openai_request(&request);
        assert_eq!(wire.model, "gpt-3.5-turbo");
        assert_eq!(wire.max_tokens, 1000);
        assert_eq!(wire.temperature, 0.7);
    }

    #[test]
    fn parse_retry_after_extracts_seconds() {
        let body = r#"{"error":{"message":"Rate limit reached, try again in 7s."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(body), 7);
    }

    #[test]
    fn parse_retry_after_defaults_without_hint() {
        let body = r#"{"error":{"message":"Rate limit reached"}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(body), 30);
    }
}
