//! Application layer: services and command handlers.

mod assistant;
pub mod handlers;

pub use assistant::{AssistantReply, AssistantService, AssistantUsage};
