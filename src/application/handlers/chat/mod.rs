//! Chat command and query handlers.

mod list_conversations;
mod send_message;

pub use list_conversations::ListConversationsHandler;
pub use send_message::{
    SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult,
};
