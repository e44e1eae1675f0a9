//! SendMessage command handler.
//!
//! Orchestrates the chat flow: ensure user, resolve conversation, persist
//! the user message, call the assistant, persist the reply, record usage,
//! and title the conversation after its first exchange.

use std::sync::Arc;

use thiserror::Error;

use crate::application::assistant::{AssistantService, AssistantUsage};
use crate::domain::chat::{ConversationContext, MessageMetadata, MessageRole};
use crate::domain::foundation::{ConversationId, UserId, UserRole};
use crate::ports::{AIError, ChatMessage, ChatStore, StoreError, UsageLedger, UsageRecord};

/// Endpoint tag written to the usage ledger.
const USAGE_ENDPOINT: &str = "chat";

/// Command to send a chat message.
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    /// The user sending the message.
    pub user_id: UserId,
    /// Target conversation; a new one is created when absent or unresolvable.
    pub conversation_id: Option<ConversationId>,
    /// Validated message content (1..=5000 chars).
    pub message: String,
    /// Optional context attached to a newly created conversation and fed
    /// into the system prompt.
    pub context: Option<ConversationContext>,
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    /// The assistant's reply.
    pub message: String,
    /// Conversation the exchange was appended to.
    pub conversation_id: ConversationId,
    /// Token and cost accounting for the AI call.
    pub usage: AssistantUsage,
}

/// Errors that can occur when sending a message.
#[derive(Debug, Error)]
pub enum SendMessageError {
    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// AI call failure.
    #[error("assistant error: {0}")]
    Assistant(#[from] AIError),
}

/// Handler for the send-message flow.
pub struct SendMessageHandler {
    store: Arc<dyn ChatStore>,
    ledger: Arc<dyn UsageLedger>,
    assistant: AssistantService,
}

impl SendMessageHandler {
    /// Creates a new handler.
    pub fn new(
        store: Arc<dyn ChatStore>,
        ledger: Arc<dyn UsageLedger>,
        assistant: AssistantService,
    ) -> Self {
        Self {
            store,
            ledger,
            assistant,
        }
    }

    /// Runs the single-pass chat flow.
    pub async fn handle(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResult, SendMessageError> {
        let default_role = command
            .context
            .as_ref()
            .and_then(|ctx| ctx.user_role)
            .unwrap_or(UserRole::Participant);

        let user = self
            .store
            .ensure_user(&command.user_id, default_role)
            .await?
            .into_inner();

        let loaded = self
            .store
            .get_or_create_conversation(
                command.conversation_id,
                &user.id,
                command.context.clone().unwrap_or_default(),
            )
            .await?
            .into_inner();
        let conversation = loaded.conversation;
        let prior_messages = loaded.recent_messages;

        // The first-exchange check looks at state before this turn's writes.
        let is_first_exchange = prior_messages.is_empty() && conversation.title.is_none();

        // Persisted before the AI call so the message survives a failure.
        self.store
            .append_message(conversation.id, MessageRole::User, &command.message, None)
            .await?;

        let mut history: Vec<ChatMessage> = prior_messages
            .iter()
            .map(|message| match message.role {
                MessageRole::User => ChatMessage::user(&message.content),
                MessageRole::Assistant => ChatMessage::assistant(&message.content),
            })
            .collect();
        history.push(ChatMessage::user(&command.message));

        let reply = self
            .assistant
            .generate_response(history, command.context.as_ref())
            .await?;

        self.store
            .append_message(
                conversation.id,
                MessageRole::Assistant,
                &reply.message,
                Some(MessageMetadata::new(
                    reply.usage.tokens,
                    reply.usage.cost,
                    self.assistant.model(),
                )),
            )
            .await?;

        self.ledger
            .record(UsageRecord::new(
                user.id.clone(),
                reply.usage.tokens,
                reply.usage.cost,
                self.assistant.model(),
                USAGE_ENDPOINT,
            ))
            .await?;

        if is_first_exchange {
            // Best-effort: neither a failed generation nor a failed write
            // may fail the request that already produced a reply.
            let title = self.assistant.generate_title(&command.message).await;
            match self.store.set_title_once(conversation.id, &title).await {
                Ok(applied) => {
                    if !applied {
                        tracing::debug!(
                            conversation_id = %conversation.id,
                            "Conversation already titled, skipping"
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        conversation_id = %conversation.id,
                        "Failed to persist conversation title: {}",
                        err
                    );
                }
            }
        }

        Ok(SendMessageResult {
            message: reply.message,
            conversation_id: conversation.id,
            usage: reply.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::storage::{InMemoryChatStore, InMemoryUsageLedger};

    fn handler(
        provider: MockAIProvider,
    ) -> (
        SendMessageHandler,
        Arc<InMemoryChatStore>,
        Arc<InMemoryUsageLedger>,
    ) {
        let store = Arc::new(InMemoryChatStore::new());
        let ledger = Arc::new(InMemoryUsageLedger::new());
        let assistant =
            AssistantService::new(Arc::new(provider), "gpt-3.5-turbo", 1000, 0.002);
        (
            SendMessageHandler::new(store.clone(), ledger.clone(), assistant),
            store,
            ledger,
        )
    }

    fn command(message: &str, conversation_id: Option<ConversationId>) -> SendMessageCommand {
        SendMessageCommand {
            user_id: UserId::new("demo-user").unwrap(),
            conversation_id,
            message: message.to_string(),
            context: None,
        }
    }

    #[tokio::test]
    async fn first_message_creates_user_conversation_and_title() {
        let provider = MockAIProvider::new()
            .with_reply("Hello! How can I help?", 120)
            .with_reply("Rust Questions", 8);
        let (handler, store, ledger) = handler(provider);

        let result = handler.handle(command("Hi there", None)).await.unwrap();

        assert_eq!(result.message, "Hello! How can I help?");
        assert_eq!(result.usage.tokens, 120);
        assert_eq!(store.user_count(), 1);
        assert_eq!(ledger.len(), 1);

        let conversation = store.conversation(result.conversation_id).unwrap();
        assert_eq!(conversation.title.as_deref(), Some("Rust Questions"));

        let messages = store.messages(result.conversation_id);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        let metadata = messages[1].metadata.as_ref().unwrap();
        assert_eq!(metadata.tokens, 120);
        assert_eq!(metadata.model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn user_message_survives_ai_failure() {
        let provider = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "down".to_string(),
        });
        let (handler, store, ledger) = handler(provider);

        let err = handler.handle(command("Hello?", None)).await.unwrap_err();
        assert!(matches!(err, SendMessageError::Assistant(_)));

        // Exactly the user message was persisted, and no usage recorded.
        let summaries = store
            .list_conversations(&UserId::new("demo-user").unwrap())
            .await
            .unwrap();
        assert_eq!(summaries.len(), 1);
        let messages = store.messages(summaries[0].id);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Hello?");
        assert_eq!(messages[0].role, MessageRole::User);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn second_turn_keeps_existing_title() {
        let provider = MockAIProvider::new()
            .with_reply("reply one", 10)
            .with_reply("Generated Title", 5)
            .with_reply("reply two", 10);
        let (handler, store, _) = handler(provider);

        let first = handler.handle(command("first", None)).await.unwrap();
        let second = handler
            .handle(command("second", Some(first.conversation_id)))
            .await
            .unwrap();

        assert_eq!(first.conversation_id, second.conversation_id);
        let conversation = store.conversation(first.conversation_id).unwrap();
        assert_eq!(conversation.title.as_deref(), Some("Generated Title"));
    }

    #[tokio::test]
    async fn title_provider_failure_still_returns_reply() {
        let provider = MockAIProvider::new()
            .with_reply("the reply", 10)
            .with_error(MockError::Network {
                message: "reset".to_string(),
            });
        let (handler, store, _) = handler(provider);

        let result = handler.handle(command("Hello", None)).await.unwrap();
        assert_eq!(result.message, "the reply");

        // The fallback title was persisted in place of a generated one.
        let conversation = store.conversation(result.conversation_id).unwrap();
        assert_eq!(conversation.title.as_deref(), Some("New Conversation"));
    }

    #[tokio::test]
    async fn round_trip_orders_messages_by_exchange() {
        let provider = MockAIProvider::new()
            .with_reply("assistant-reply-1", 10)
            .with_reply("A Title", 4)
            .with_reply("assistant-reply-2", 10);
        let (handler, store, _) = handler(provider);

        let first = handler.handle(command("M1", None)).await.unwrap();
        handler
            .handle(command("M2", Some(first.conversation_id)))
            .await
            .unwrap();

        let contents: Vec<String> = store
            .messages(first.conversation_id)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(
            contents,
            vec!["M1", "assistant-reply-1", "M2", "assistant-reply-2"]
        );
    }

    #[tokio::test]
    async fn prior_history_is_sent_oldest_first_with_new_message_last() {
        let provider = MockAIProvider::new()
            .with_reply("r1", 10)
            .with_reply("Title", 3)
            .with_reply("r2", 10);
        let (handler, _, _) = handler(provider.clone());

        let first = handler.handle(command("M1", None)).await.unwrap();
        handler
            .handle(command("M2", Some(first.conversation_id)))
            .await
            .unwrap();

        // Third call is the second chat completion (after reply + title).
        let calls = provider.calls();
        let history = &calls[2].messages;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "M1");
        assert_eq!(history[1].content, "r1");
        assert_eq!(history[2].content, "M2");
    }

    #[tokio::test]
    async fn context_role_becomes_default_user_role() {
        let provider = MockAIProvider::new()
            .with_reply("reply", 10)
            .with_reply("Title", 3);
        let (handler, store, _) = handler(provider);

        let mut cmd = command("Hello", None);
        cmd.context = Some(ConversationContext {
            user_role: Some(UserRole::Judge),
            ..Default::default()
        });
        handler.handle(cmd).await.unwrap();

        let user = store
            .ensure_user(&UserId::new("demo-user").unwrap(), UserRole::Participant)
            .await
            .unwrap();
        assert!(!user.was_created());
        assert_eq!(user.inner().role, UserRole::Judge);
    }

    #[tokio::test]
    async fn unresolvable_conversation_id_starts_fresh() {
        let provider = MockAIProvider::new()
            .with_reply("reply", 10)
            .with_reply("Title", 3);
        let (handler, store, _) = handler(provider);

        let ghost = ConversationId::new();
        let result = handler.handle(command("Hello", Some(ghost))).await.unwrap();

        assert_ne!(result.conversation_id, ghost);
        assert_eq!(store.messages(result.conversation_id).len(), 2);
    }

    #[tokio::test]
    async fn usage_record_carries_model_and_endpoint() {
        let provider = MockAIProvider::new()
            .with_reply("reply", 1000)
            .with_reply("Title", 3);
        let (handler, _, ledger) = handler(provider);

        handler.handle(command("Hello", None)).await.unwrap();

        let records = ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tokens_used, 1000);
        assert_eq!(records[0].cost, 0.002);
        assert_eq!(records[0].model, "gpt-3.5-turbo");
        assert_eq!(records[0].endpoint, "chat");
    }
}
