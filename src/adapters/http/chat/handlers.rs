//! HTTP handlers for the chat endpoints.
//!
//! These handlers connect Axum routes to application layer operations and
//! map failures onto response codes: validation detail goes back to the
//! caller, everything else collapses to an opaque internal error.

use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::chat::{
    ListConversationsHandler, SendMessageError, SendMessageHandler,
};
use crate::domain::foundation::UserId;

use super::dto::{
    ChatRequestBody, ChatResponseBody, ConversationView, ConversationsQuery,
    ConversationsResponseBody, ErrorResponse, FieldError, DEFAULT_USER_ID,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub send_message: Arc<SendMessageHandler>,
    pub list_conversations: Arc<ListConversationsHandler>,
}

impl ChatAppState {
    /// Creates a new ChatAppState.
    pub fn new(
        send_message: Arc<SendMessageHandler>,
        list_conversations: Arc<ListConversationsHandler>,
    ) -> Self {
        Self {
            send_message,
            list_conversations,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat - Send a message and receive the assistant's reply.
///
/// # Errors
/// - 400 Bad Request: validation failure, with field-level detail
/// - 500 Internal Server Error: store or provider failure
pub async fn post_chat(
    State(state): State<ChatAppState>,
    Json(body): Json<ChatRequestBody>,
) -> Result<impl IntoResponse, ChatApiError> {
    let command = body.validate().map_err(ChatApiError::BadRequest)?;

    let result = state.send_message.handle(command).await.map_err(|err| {
        match &err {
            // Distinguished at this boundary, but collapsed to the same
            // opaque response so no configuration detail leaks out.
            SendMessageError::Assistant(ai_err) if ai_err.is_configuration() => {
                tracing::error!("Chat request failed: AI provider is not configured");
            }
            other => {
                tracing::error!("Chat request failed: {}", other);
            }
        }
        ChatApiError::Internal
    })?;

    Ok((StatusCode::OK, Json(ChatResponseBody::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /conversations
// ════════════════════════════════════════════════════════════════════════════════

/// GET /conversations?userId= - List a user's conversations.
///
/// Returns conversations newest-updated first. `userId` defaults to the
/// demo identity when absent or empty.
///
/// # Errors
/// - 500 Internal Server Error: store failure
pub async fn get_conversations(
    State(state): State<ChatAppState>,
    Query(query): Query<ConversationsQuery>,
) -> Result<impl IntoResponse, ChatApiError> {
    let user_id = UserId::new(
        query
            .user_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
    )
    .map_err(|_| {
        ChatApiError::BadRequest(vec![FieldError {
            field: "userId".to_string(),
            message: "must not be empty".to_string(),
        }])
    })?;

    let summaries = state
        .list_conversations
        .handle(&user_id)
        .await
        .map_err(|err| {
            tracing::error!("Conversation listing failed: {}", err);
            ChatApiError::Internal
        })?;

    let conversations = summaries.into_iter().map(ConversationView::from).collect();
    Ok((
        StatusCode::OK,
        Json(ConversationsResponseBody { conversations }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts chat failures to HTTP responses.
#[derive(Debug)]
pub enum ChatApiError {
    BadRequest(Vec<FieldError>),
    Internal,
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ChatApiError::BadRequest(details) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::invalid_request(details),
            ),
            ChatApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::internal())
            }
        };

        (status, Json(error)).into_response()
    }
}
