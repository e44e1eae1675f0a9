//! ListConversations query handler.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::ports::{ChatStore, ConversationSummary, StoreError};

/// Handler for the conversation listing.
pub struct ListConversationsHandler {
    store: Arc<dyn ChatStore>,
}

impl ListConversationsHandler {
    /// Creates a new handler.
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Lists a user's conversations, newest-updated first.
    pub async fn handle(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        self.store.list_conversations(user_id).await
    }
}
