//! Shared domain types for the Galleria backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a turn. The store only ever holds these two roles; the
/// system prompt exists solely in the assembled collaborator payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a stored role string. Returns `None` for anything outside the
    /// CHECK constraint; the schema makes that unreachable in practice.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message row in a conversation, as returned by history retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Epoch microseconds; strictly monotonic per user.
    pub timestamp: i64,
    /// Globally unique token used for feedback correlation.
    pub message_token: Uuid,
    /// One of -1, 0, +1.
    pub feedback: i32,
}

/// A commercial-center tenant scoping users, messages, and knowledge content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub location: String,
    pub website: String,
}

/// Summary of one logical chat thread owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    /// Epoch microseconds.
    pub created_at: i64,
    /// Epoch microseconds; bumped whenever a turn lands in the thread.
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), None);
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"assistant\"").unwrap(),
            Role::Assistant
        );
    }

    #[test]
    fn test_turn_serializes_token_as_string() {
        let turn = Turn {
            role: Role::Assistant,
            content: "Bonjour".to_string(),
            timestamp: 1_700_000_000_000_000,
            message_token: Uuid::nil(),
            feedback: 1,
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(
            json["message_token"],
            "00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(json["feedback"], 1);
    }
}
