//! Axum routes for the chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{get_conversations, post_chat, ChatAppState};

/// Creates routes for the chat endpoints.
///
/// - POST /chat - Send a message, receive the assistant's reply
/// - GET /conversations - List a user's conversations
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(post_chat))
        .route("/conversations", get(get_conversations))
}

/// Router with the chat routes bound to the given state.
pub fn chat_router(state: ChatAppState) -> Router {
    chat_routes().with_state(state)
}
