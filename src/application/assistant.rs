//! Assistant service - composes prompts, derives cost, and shields callers
//! from title-generation failures.
//!
//! The service owns an injected [`AIProvider`] instance; it is constructed
//! once at process start and handed to the request-handling layer, so tests
//! can substitute a mock transport.

use std::sync::Arc;

use crate::config::AiConfig;
use crate::domain::chat::{build_system_prompt, ConversationContext, TITLE_PROMPT};
use crate::ports::{AIError, AIProvider, ChatMessage, ChatRequest};

/// Text returned when the provider produces no content.
const FALLBACK_RESPONSE: &str = "Sorry, I could not generate a response.";

/// Title used when title generation fails.
const FALLBACK_TITLE: &str = "New Conversation";

/// Sampling temperature for chat replies.
const RESPONSE_TEMPERATURE: f32 = 0.7;

/// Sampling temperature for title generation.
const TITLE_TEMPERATURE: f32 = 0.5;

/// Output bound for title generation.
const TITLE_MAX_TOKENS: u32 = 50;

/// Token and cost accounting for one reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssistantUsage {
    /// Total tokens reported by the provider.
    pub tokens: u32,
    /// Derived cost in USD.
    pub cost: f64,
}

/// A generated assistant reply.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub message: String,
    pub usage: AssistantUsage,
}

/// Service wrapping the completion provider.
#[derive(Clone)]
pub struct AssistantService {
    provider: Arc<dyn AIProvider>,
    model: String,
    max_tokens: u32,
    cost_per_1k_tokens: f64,
}

impl AssistantService {
    /// Creates a new assistant service.
    pub fn new(
        provider: Arc<dyn AIProvider>,
        model: impl Into<String>,
        max_tokens: u32,
        cost_per_1k_tokens: f64,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            cost_per_1k_tokens,
        }
    }

    /// Creates a service from the application AI configuration.
    pub fn from_config(provider: Arc<dyn AIProvider>, config: &AiConfig) -> Self {
        Self::new(
            provider,
            config.model.clone(),
            config.max_tokens,
            config.cost_per_1k_tokens,
        )
    }

    /// The model identifier recorded in metadata and the usage ledger.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Derives cost from a token count at the configured per-1K rate.
    pub fn calculate_cost(&self, tokens: u32) -> f64 {
        (tokens as f64 / 1000.0) * self.cost_per_1k_tokens
    }

    /// Generates a reply for the given history and context.
    ///
    /// The system prompt is composed from the base instructions plus the
    /// context fields that are present. Empty provider content is replaced
    /// with a fixed placeholder rather than surfaced to the user.
    pub async fn generate_response(
        &self,
        history: Vec<ChatMessage>,
        context: Option<&ConversationContext>,
    ) -> Result<AssistantReply, AIError> {
        let request = ChatRequest::new(self.max_tokens, RESPONSE_TEMPERATURE)
            .with_system_prompt(build_system_prompt(context))
            .with_messages(history);

        let completion = self.provider.complete(request).await?;

        let message = if completion.content.is_empty() {
            FALLBACK_RESPONSE.to_string()
        } else {
            completion.content
        };

        let tokens = completion.total_tokens;
        Ok(AssistantReply {
            message,
            usage: AssistantUsage {
                tokens,
                cost: self.calculate_cost(tokens),
            },
        })
    }

    /// Generates a short conversation title from the first message.
    ///
    /// Never fails: any provider error (including a missing credential)
    /// yields the fixed fallback title.
    pub async fn generate_title(&self, first_message: &str) -> String {
        let request = ChatRequest::new(TITLE_MAX_TOKENS, TITLE_TEMPERATURE)
            .with_system_prompt(TITLE_PROMPT)
            .with_message(crate::ports::ChatRole::User, first_message);

        match self.provider.complete(request).await {
            Ok(completion) if !completion.content.is_empty() => completion.content,
            Ok(_) => FALLBACK_TITLE.to_string(),
            Err(err) => {
                tracing::warn!("Title generation failed: {}", err);
                FALLBACK_TITLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::foundation::UserRole;
    use crate::ports::ChatRole;
    use proptest::prelude::*;

    fn service(provider: MockAIProvider) -> AssistantService {
        AssistantService::new(Arc::new(provider), "gpt-3.5-turbo", 1000, 0.002)
    }

    #[test]
    fn cost_of_1000_tokens_equals_rate() {
        let svc = service(MockAIProvider::new());
        assert_eq!(svc.calculate_cost(1000), 0.002);
    }

    #[test]
    fn cost_of_zero_tokens_is_zero() {
        let svc = service(MockAIProvider::new());
        assert_eq!(svc.calculate_cost(0), 0.0);
    }

    proptest! {
        #[test]
        fn cost_is_proportional_and_non_negative(tokens in 0u32..2_000_000) {
            let svc = service(MockAIProvider::new());
            let cost = svc.calculate_cost(tokens);
            prop_assert!(cost >= 0.0);
            prop_assert!((cost - (tokens as f64 / 1000.0) * 0.002).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn response_carries_tokens_and_derived_cost() {
        let provider = MockAIProvider::new().with_reply("Traits are like interfaces.", 1500);
        let svc = service(provider);

        let reply = svc
            .generate_response(vec![ChatMessage::user("What are traits?")], None)
            .await
            .unwrap();

        assert_eq!(reply.message, "Traits are like interfaces.");
        assert_eq!(reply.usage.tokens, 1500);
        assert!((reply.usage.cost - 0.003).abs() < 1e-12);
    }

    #[tokio::test]
    async fn empty_provider_content_becomes_placeholder() {
        let provider = MockAIProvider::new().with_reply("", 12);
        let svc = service(provider);

        let reply = svc
            .generate_response(vec![ChatMessage::user("Hello")], None)
            .await
            .unwrap();

        assert_eq!(reply.message, FALLBACK_RESPONSE);
        assert_eq!(reply.usage.tokens, 12);
    }

    #[tokio::test]
    async fn provider_errors_propagate_from_generate_response() {
        let provider = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "down".to_string(),
        });
        let svc = service(provider);

        let result = svc
            .generate_response(vec![ChatMessage::user("Hello")], None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn system_prompt_reflects_context() {
        let provider = MockAIProvider::new().with_reply("ok", 1);
        let svc = service(provider.clone());

        let context = ConversationContext {
            page: Some("leaderboard".to_string()),
            user_role: Some(UserRole::Judge),
            ..Default::default()
        };

        svc.generate_response(vec![ChatMessage::user("Hi")], Some(&context))
            .await
            .unwrap();

        let calls = provider.calls();
        let prompt = calls[0].system_prompt.as_deref().unwrap();
        assert!(prompt.contains("- User Role: JUDGE"));
        assert!(prompt.contains("- Current Page: leaderboard"));
        assert!(!prompt.contains("Event ID"));
        assert_eq!(calls[0].temperature, 0.7);
        assert_eq!(calls[0].max_tokens, 1000);
    }

    #[tokio::test]
    async fn title_uses_low_temperature_and_short_output() {
        let provider = MockAIProvider::new().with_reply("Rust Trait Basics", 8);
        let svc = service(provider.clone());

        let title = svc.generate_title("What are traits in Rust?").await;
        assert_eq!(title, "Rust Trait Basics");

        let calls = provider.calls();
        assert_eq!(calls[0].temperature, 0.5);
        assert_eq!(calls[0].max_tokens, 50);
        assert_eq!(calls[0].system_prompt.as_deref(), Some(TITLE_PROMPT));
        assert_eq!(calls[0].messages[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn title_failure_yields_fallback() {
        let provider = MockAIProvider::new().with_error(MockError::Network {
            message: "connection reset".to_string(),
        });
        let svc = service(provider);

        let title = svc.generate_title("Hello").await;
        assert_eq!(title, FALLBACK_TITLE);
    }

    #[tokio::test]
    async fn empty_title_yields_fallback() {
        let provider = MockAIProvider::new().with_reply("", 0);
        let svc = service(provider);

        let title = svc.generate_title("Hello").await;
        assert_eq!(title, FALLBACK_TITLE);
    }
}
