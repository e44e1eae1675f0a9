//! Message entity and its metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, ValidationError};

/// Role of a stored message's author.
///
/// Stored and serialized in SCREAMING_SNAKE_CASE ("USER" / "ASSISTANT").
/// System prompts are composed per-request and never persisted, so there is
/// no stored system role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Returns the storage representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "USER",
            MessageRole::Assistant => "ASSISTANT",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(MessageRole::User),
            "ASSISTANT" => Ok(MessageRole::Assistant),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown message role '{}'", other),
            )),
        }
    }
}

/// Generation metadata attached to assistant messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Total tokens consumed by the generation call.
    pub tokens: u32,
    /// Derived cost in USD.
    pub cost: f64,
    /// Model that produced the content.
    pub model: String,
}

impl MessageMetadata {
    /// Creates new generation metadata.
    pub fn new(tokens: u32, cost: f64, model: impl Into<String>) -> Self {
        Self {
            tokens,
            cost,
            model: model.into(),
        }
    }
}

/// A single message in a conversation.
///
/// Messages are immutable once written and ordered by creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub created_at: Timestamp,
}

impl Message {
    /// Creates a new user message.
    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::User,
            content: content.into(),
            metadata: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates a new assistant message with generation metadata.
    pub fn assistant(
        conversation_id: ConversationId,
        content: impl Into<String>,
        metadata: MessageMetadata,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::Assistant,
            content: content.into(),
            metadata: Some(metadata),
            created_at: Timestamp::now(),
        }
    }
}
