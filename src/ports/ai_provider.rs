//! AI Provider Port - Interface for chat-completion API integrations.
//!
//! This port abstracts the completion transport, enabling the assistant
//! service to generate replies without coupling to a specific provider.
//! Prompt composition, cost derivation, and fallback text live above this
//! port in [`crate::application::AssistantService`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for chat-completion providers.
///
/// Implementations connect to an external completion API and translate
/// between the provider wire format and our request/response types.
/// Each call is a single attempt; no layer retries a failed completion.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generates a single completion for the given request.
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, AIError>;

    /// The model identifier requests are sent with.
    fn model(&self) -> &str;
}

/// Request for a chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation messages, oldest first, current user message last.
    pub messages: Vec<ChatMessage>,
    /// System prompt prepended to the conversation.
    pub system_prompt: Option<String>,
    /// Bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ChatRequest {
    /// Creates a request with the given output bound and temperature.
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens,
            temperature,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    /// Replaces the message list wholesale.
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// A message in the model-facing conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Creates a new message.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Role of a model-facing message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// Response from a completion call.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Generated content. May be empty when the provider returns nothing;
    /// the caller decides on fallback text.
    pub content: String,
    /// Total tokens (prompt + completion) reported by the provider.
    pub total_tokens: u32,
    /// Model that generated the response.
    pub model: String,
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    /// No credential is configured. Distinct from transport failures so
    /// callers can surface it as its own condition.
    #[error("provider not configured: {0}")]
    Configuration(String),

    /// API key was rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider rejected the request payload.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl AIError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error means no credential is configured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AIError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_builder_works() {
        let request = ChatRequest::new(1000, 0.7)
            .with_message(ChatRole::User, "Hello")
            .with_system_prompt("Be helpful");

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.messages[0].content, "Hello");
        assert_eq!(request.system_prompt, Some("Be helpful".to_string()));
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.temperature, 0.7);
    }

    #[test]
    fn message_constructors_work() {
        let user = ChatMessage::user("Hello");
        let assistant = ChatMessage::assistant("Hi there");

        assert_eq!(user.role, ChatRole::User);
        assert_eq!(assistant.role, ChatRole::Assistant);
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(
            serde_json::to_string(&ChatRole::System).unwrap(),
            "\"system\""
        );
    }

    #[test]
    fn configuration_error_is_distinguishable() {
        let err = AIError::configuration("OPENAI_API_KEY is not set");
        assert!(err.is_configuration());
        assert!(!AIError::AuthenticationFailed.is_configuration());
        assert!(!AIError::network("connection reset").is_configuration());
    }

    #[test]
    fn ai_error_displays_correctly() {
        let err = AIError::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(err.to_string(), "rate limited: retry after 30s");

        let err = AIError::configuration("no key");
        assert_eq!(err.to_string(), "provider not configured: no key");
    }
}
