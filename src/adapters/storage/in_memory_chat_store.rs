//! In-memory chat store implementation.
//!
//! This adapter provides an in-memory implementation of the `ChatStore`
//! port. Useful for:
//! - Development environments without a database
//! - Tests exercising the full chat flow
//!
//! For deployments requiring persistence, use the PostgreSQL-backed
//! implementation instead.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::chat::{
    Conversation, ConversationContext, Message, MessageMetadata, MessageRole, User,
};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId, UserRole};
use crate::ports::{
    ChatStore, ConversationSummary, ConversationWithHistory, Fetched, StoreError,
    RECENT_HISTORY_LIMIT,
};

struct ConversationEntry {
    conversation: Conversation,
    /// Messages in append order.
    messages: Vec<Message>,
}

/// In-memory implementation of the ChatStore port.
///
/// Thread-safe via internal `Mutex`. Does not persist data across restarts.
#[derive(Default)]
pub struct InMemoryChatStore {
    users: Mutex<HashMap<UserId, User>>,
    conversations: Mutex<Vec<ConversationEntry>>,
}

impl InMemoryChatStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Returns a conversation by id, if present.
    pub fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.conversations
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.conversation.id == id)
            .map(|entry| entry.conversation.clone())
    }

    /// Returns all messages of a conversation in append order.
    pub fn messages(&self, id: ConversationId) -> Vec<Message> {
        self.conversations
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.conversation.id == id)
            .map(|entry| entry.messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn ensure_user(
        &self,
        id: &UserId,
        default_role: UserRole,
    ) -> Result<Fetched<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get(id) {
            return Ok(Fetched::Found(user.clone()));
        }

        let user = User::demo(id.clone(), default_role);
        users.insert(id.clone(), user.clone());
        Ok(Fetched::Created(user))
    }

    async fn get_or_create_conversation(
        &self,
        id: Option<ConversationId>,
        owner: &UserId,
        context: ConversationContext,
    ) -> Result<Fetched<ConversationWithHistory>, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();

        if let Some(id) = id {
            if let Some(entry) = conversations
                .iter()
                .find(|entry| entry.conversation.id == id)
            {
                let start = entry.messages.len().saturating_sub(RECENT_HISTORY_LIMIT);
                return Ok(Fetched::Found(ConversationWithHistory {
                    conversation: entry.conversation.clone(),
                    recent_messages: entry.messages[start..].to_vec(),
                }));
            }
            // An unresolvable id falls through to creation.
        }

        let conversation = Conversation::new(owner.clone(), context);
        conversations.push(ConversationEntry {
            conversation: conversation.clone(),
            messages: Vec::new(),
        });

        Ok(Fetched::Created(ConversationWithHistory {
            conversation,
            recent_messages: Vec::new(),
        }))
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
        metadata: Option<MessageMetadata>,
    ) -> Result<Message, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let entry = conversations
            .iter_mut()
            .find(|entry| entry.conversation.id == conversation_id)
            .ok_or_else(|| {
                StoreError::database(format!("conversation {} not found", conversation_id))
            })?;

        let message = Message {
            id: MessageId::new(),
            conversation_id,
            role,
            content: content.to_string(),
            metadata,
            created_at: Timestamp::now(),
        };

        entry.messages.push(message.clone());
        entry.conversation.updated_at = message.created_at;
        Ok(message)
    }

    async fn set_title_once(
        &self,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<bool, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let entry = conversations
            .iter_mut()
            .find(|entry| entry.conversation.id == conversation_id)
            .ok_or_else(|| {
                StoreError::database(format!("conversation {} not found", conversation_id))
            })?;

        if entry.conversation.title.is_some() {
            return Ok(false);
        }

        entry.conversation.title = Some(title.to_string());
        entry.conversation.updated_at = Timestamp::now();
        Ok(true)
    }

    async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let conversations = self.conversations.lock().unwrap();

        let mut summaries: Vec<ConversationSummary> = conversations
            .iter()
            .filter(|entry| &entry.conversation.user_id == user_id)
            .map(|entry| ConversationSummary {
                id: entry.conversation.id,
                title: entry.conversation.title.clone(),
                last_message: entry.messages.last().map(|m| m.content.clone()),
                updated_at: entry.conversation.updated_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}
