//! Chat domain: users, conversations, messages, and prompt assembly.

mod conversation;
mod message;
mod prompt;
mod user;

pub use conversation::{Conversation, ConversationContext};
pub use message::{Message, MessageMetadata, MessageRole};
pub use prompt::{build_system_prompt, BASE_PROMPT, TITLE_PROMPT};
pub use user::User;
