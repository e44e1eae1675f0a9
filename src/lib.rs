//! DevX Assistant - AI chat assistant backend
//!
//! This crate persists chat conversations and proxies user messages to a
//! chat-completion API, composing a context-aware system prompt for each call.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
