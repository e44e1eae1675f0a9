//! ChatStore port - persistence interface for users, conversations, and messages.
//!
//! Lookups that find nothing are not errors here: `ensure_user` and
//! `get_or_create_conversation` model fetch-or-create explicitly as
//! try-load-then-branch operations returning a tagged [`Fetched`] result.

use async_trait::async_trait;

use crate::domain::chat::{
    Conversation, ConversationContext, Message, MessageMetadata, MessageRole, User,
};
use crate::domain::foundation::{ConversationId, Timestamp, UserId, UserRole};

/// Number of most recent messages loaded as model context.
pub const RECENT_HISTORY_LIMIT: usize = 20;

/// Outcome of a fetch-or-create operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The entity already existed.
    Found(T),
    /// The entity was created by this call.
    Created(T),
}

impl<T> Fetched<T> {
    /// Unwraps the entity regardless of how it was obtained.
    pub fn into_inner(self) -> T {
        match self {
            Fetched::Found(value) | Fetched::Created(value) => value,
        }
    }

    /// Borrows the entity regardless of how it was obtained.
    pub fn inner(&self) -> &T {
        match self {
            Fetched::Found(value) | Fetched::Created(value) => value,
        }
    }

    /// Returns true when the entity was created by this call.
    pub fn was_created(&self) -> bool {
        matches!(self, Fetched::Created(_))
    }
}

/// A conversation loaded together with its recent history.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationWithHistory {
    pub conversation: Conversation,
    /// Up to [`RECENT_HISTORY_LIMIT`] most recent messages, oldest first.
    pub recent_messages: Vec<Message>,
}

/// Listing row for a user's conversations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: Option<String>,
    /// Content of the single newest message, if any.
    pub last_message: Option<String>,
    pub updated_at: Timestamp,
}

/// Persistence port for the chat flow.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch-or-create a user. On miss, persists the demo identity with the
    /// given default role.
    async fn ensure_user(
        &self,
        id: &UserId,
        default_role: UserRole,
    ) -> Result<Fetched<User>, StoreError>;

    /// Loads the conversation with its recent history when `id` resolves;
    /// otherwise creates a new empty conversation carrying `context`.
    /// An id that resolves to nothing is not an error.
    async fn get_or_create_conversation(
        &self,
        id: Option<ConversationId>,
        owner: &UserId,
        context: ConversationContext,
    ) -> Result<Fetched<ConversationWithHistory>, StoreError>;

    /// Appends a message to a conversation and bumps its `updated_at`.
    /// Never reorders or mutates prior messages.
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
        metadata: Option<MessageMetadata>,
    ) -> Result<Message, StoreError>;

    /// Sets the conversation title if none exists yet.
    ///
    /// Returns true when the title was applied, false when the conversation
    /// was already titled (the call is then a no-op).
    async fn set_title_once(
        &self,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<bool, StoreError>;

    /// Lists a user's conversations, newest-updated first.
    async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError>;
}

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ConversationContext;

    #[test]
    fn fetched_found_is_not_created() {
        let fetched = Fetched::Found(42);
        assert!(!fetched.was_created());
        assert_eq!(fetched.into_inner(), 42);
    }

    #[test]
    fn fetched_created_reports_creation() {
        let fetched = Fetched::Created("conversation");
        assert!(fetched.was_created());
        assert_eq!(*fetched.inner(), "conversation");
    }

    #[test]
    fn conversation_with_history_holds_ordered_messages() {
        let conversation = Conversation::new(
            UserId::new("demo-user").unwrap(),
            ConversationContext::default(),
        );
        let first = Message::user(conversation.id, "first");
        let second = Message::user(conversation.id, "second");

        let loaded = ConversationWithHistory {
            conversation,
            recent_messages: vec![first.clone(), second.clone()],
        };

        assert_eq!(loaded.recent_messages[0].content, "first");
        assert_eq!(loaded.recent_messages[1].content, "second");
    }
}
