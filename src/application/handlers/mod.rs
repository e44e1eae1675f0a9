//! Application command handlers.

pub mod chat;
