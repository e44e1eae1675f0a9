//! HTTP DTOs for the chat endpoints.
//!
//! These types decouple the HTTP API from domain types and own payload
//! validation, reporting failures as field-level errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::handlers::chat::{SendMessageCommand, SendMessageResult};
use crate::application::AssistantUsage;
use crate::domain::chat::ConversationContext;
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::ConversationSummary;

/// User identity assumed when the request carries none.
pub const DEFAULT_USER_ID: &str = "demo-user";

/// Maximum accepted message length in characters.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Title shown for conversations that were never titled.
const UNTITLED_PLACEHOLDER: &str = "New Conversation";

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: Option<ContextBody>,
}

/// Context object of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBody {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub additional_data: Option<Map<String, Value>>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ChatRequestBody {
    /// Validates the payload into a command, collecting field errors.
    pub fn validate(self) -> Result<SendMessageCommand, Vec<FieldError>> {
        let mut errors = Vec::new();

        let length = self.message.chars().count();
        if length == 0 {
            errors.push(FieldError::new("message", "must not be empty"));
        } else if length > MAX_MESSAGE_CHARS {
            errors.push(FieldError::new(
                "message",
                format!("must be at most {} characters", MAX_MESSAGE_CHARS),
            ));
        }

        let user_id = match UserId::new(
            self.user_id
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
        ) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(FieldError::new("userId", "must not be empty"));
                None
            }
        };

        let context = match self.context.map(ContextBody::validate).transpose() {
            Ok(context) => context,
            Err(err) => {
                errors.push(err);
                None
            }
        };

        // An id that does not parse cannot resolve to a stored conversation,
        // so it falls through to creation like any other unresolvable id.
        let conversation_id = self
            .conversation_id
            .and_then(|raw| raw.parse::<ConversationId>().ok());

        match user_id {
            Some(user_id) if errors.is_empty() => Ok(SendMessageCommand {
                user_id,
                conversation_id,
                message: self.message,
                context,
            }),
            _ => Err(errors),
        }
    }
}

impl ContextBody {
    fn validate(self) -> Result<ConversationContext, FieldError> {
        let user_role = self
            .user_role
            .map(|raw| {
                raw.parse().map_err(|_| {
                    FieldError::new(
                        "context.userRole",
                        "must be one of SUPER_ADMIN, ORGANIZER, PARTICIPANT, JUDGE",
                    )
                })
            })
            .transpose()?;

        Ok(ConversationContext {
            page: self.page,
            event_id: self.event_id,
            user_role,
            additional_data: self.additional_data,
        })
    }
}

/// Query parameters of `GET /conversations`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Token and cost accounting in the chat response.
#[derive(Debug, Clone, Serialize)]
pub struct UsageView {
    pub tokens: u32,
    pub cost: f64,
}

impl From<AssistantUsage> for UsageView {
    fn from(usage: AssistantUsage) -> Self {
        Self {
            tokens: usage.tokens,
            cost: usage.cost,
        }
    }
}

/// Body of a successful `POST /chat` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseBody {
    pub message: String,
    pub conversation_id: String,
    pub usage: UsageView,
}

impl From<SendMessageResult> for ChatResponseBody {
    fn from(result: SendMessageResult) -> Self {
        Self {
            message: result.message,
            conversation_id: result.conversation_id.to_string(),
            usage: result.usage.into(),
        }
    }
}

/// Listing row of `GET /conversations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub title: String,
    pub last_message: String,
    pub updated_at: String,
}

impl From<ConversationSummary> for ConversationView {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            title: summary
                .title
                .unwrap_or_else(|| UNTITLED_PLACEHOLDER.to_string()),
            last_message: summary.last_message.unwrap_or_default(),
            updated_at: summary.updated_at.to_rfc3339(),
        }
    }
}

/// Body of a successful `GET /conversations` response.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationsResponseBody {
    pub conversations: Vec<ConversationView>,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    /// Validation failure with field-level detail.
    pub fn invalid_request(details: Vec<FieldError>) -> Self {
        Self {
            error: "Invalid request data".to_string(),
            details: Some(details),
        }
    }

    /// Opaque internal failure. Carries no internal detail.
    pub fn internal() -> Self {
        Self {
            error: "Internal server error".to_string(),
            details: None,
        }
    }
}
