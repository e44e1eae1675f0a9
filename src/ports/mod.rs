//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.

mod ai_provider;
mod chat_store;
mod usage_ledger;

pub use ai_provider::{AIError, AIProvider, ChatCompletion, ChatMessage, ChatRequest, ChatRole};
pub use chat_store::{
    ChatStore, ConversationSummary, ConversationWithHistory, Fetched, StoreError,
    RECENT_HISTORY_LIMIT,
};
pub use usage_ledger::{UsageLedger, UsageRecord};
