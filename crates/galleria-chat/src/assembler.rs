//! Prompt assembly for the completion collaborator.
//!
//! Builds the ordered message list `[system] ++ history ++ [new turn]`.
//! Pure functions of their inputs; no state is retained between calls.

use serde::Serialize;

use galleria_core::types::Turn;

/// One entry in the collaborator payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Assemble the exact payload handed to the completion collaborator.
///
/// History turns are already role-restricted (the `Role` type only admits
/// user and assistant) and already bounded by the history limit; no further
/// filtering or truncation happens here.
pub fn build_prompt(
    system_prompt: &str,
    history: &[Turn],
    new_user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system_prompt));
    for turn in history {
        messages.push(PromptMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        });
    }
    messages.push(PromptMessage::user(new_user_message));
    messages
}
