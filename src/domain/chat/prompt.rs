//! System prompt assembly.
//!
//! Every model-facing request is prefixed with a fixed base instruction set
//! plus a context section derived from the conversation's context blob.

use std::fmt::Write;

use super::ConversationContext;

/// Base instructions prepended to every chat completion.
pub const BASE_PROMPT: &str = "You are DevX, an AI-powered assistant that transforms complex technical concepts, documentation, and code into short, visual, real-life explanations. Your goal is to:

1. Break down complex technical concepts into simple, digestible explanations
2. Use real-world analogies to make abstract ideas concrete
3. Provide visual descriptions when helpful (e.g., \"imagine this like...\")
4. Keep responses concise and focused
5. Adapt to the user's technical level

When explaining code:
- Identify the core functionality and purpose
- Explain patterns and best practices
- Use simple language and avoid jargon when possible

When explaining concepts:
- Start with the \"what\" and \"why\"
- Use analogies from everyday life
- Build from simple to complex progressively";

/// Instruction used for the title-generation call.
pub const TITLE_PROMPT: &str =
    "Generate a short, concise title (max 5 words) for this conversation based on the first message.";

/// Builds the system prompt for a request.
///
/// The context section lists only the fields present among role, page, and
/// event id, one line each. When no context (or an empty one) is supplied,
/// the section is omitted entirely.
pub fn build_system_prompt(context: Option<&ConversationContext>) -> String {
    let context = match context {
        Some(ctx) if !ctx.is_empty() => ctx,
        _ => return BASE_PROMPT.to_string(),
    };

    let mut prompt = String::from(BASE_PROMPT);
    prompt.push_str("\n\nCurrent Context:\n");

    if let Some(role) = context.user_role {
        let _ = writeln!(prompt, "- User Role: {}", role);
    }
    if let Some(ref page) = context.page {
        let _ = writeln!(prompt, "- Current Page: {}", page);
    }
    if let Some(ref event_id) = context.event_id {
        let _ = writeln!(prompt, "- Event ID: {}", event_id);
    }

    prompt
}
