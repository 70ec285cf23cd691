//! Repository implementations for SQLite-backed persistence.
//!
//! Provides TenantRepository, UserRepository, ConversationRepository, and
//! MessageRepository operating on the Database struct using raw SQL.
//! Identifiers arrive here as typed `Uuid` values; textual validation
//! happens at the HTTP boundary.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use galleria_core::error::GalleriaError;
use galleria_core::types::{ConversationSummary, Role, Tenant, Turn};

use crate::db::Database;

/// Upper bound on any history retrieval.
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Repository for commercial-center tenants.
pub struct TenantRepository {
    db: Arc<Database>,
}

impl TenantRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a tenant if absent. Existing rows are left untouched, so
    /// repeated startup provisioning is a no-op.
    pub fn provision(&self, tenant: &Tenant) -> Result<(), GalleriaError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO tenants (id, name, location, website)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![tenant.id, tenant.name, tenant.location, tenant.website],
            )
            .map_err(|e| GalleriaError::Storage(format!("Failed to provision tenant: {}", e)))?;
            Ok(())
        })
    }

    pub fn find(&self, id: &str) -> Result<Option<Tenant>, GalleriaError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, location, website FROM tenants WHERE id = ?1",
                rusqlite::params![id],
                |row| {
                    Ok(Tenant {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        website: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|e| GalleriaError::Storage(e.to_string()))
        })
    }
}

/// Repository for per-browser-session users.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a user id if unseen. At most one insert per id; a repeated
    /// call performs no additional write.
    pub fn upsert(&self, id: Uuid, tenant_id: &str) -> Result<(), GalleriaError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, tenant_id) VALUES (?1, ?2)",
                rusqlite::params![id.to_string(), tenant_id],
            )
            .map_err(|e| GalleriaError::Storage(format!("Failed to register user: {}", e)))?;
            Ok(())
        })
    }

    pub fn exists(&self, id: Uuid) -> Result<bool, GalleriaError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM users WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;
            Ok(count > 0)
        })
    }
}

/// Repository for conversation sessions (logical chat threads).
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new conversation session owned by the given user.
    pub fn create(
        &self,
        user_id: Uuid,
        tenant_id: &str,
        title: &str,
    ) -> Result<ConversationSummary, GalleriaError> {
        let id = Uuid::new_v4();
        let now = Utc::now().timestamp_micros();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversation_sessions (id, user_id, tenant_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id.to_string(), user_id.to_string(), tenant_id, title, now],
            )
            .map_err(|e| GalleriaError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(())
        })?;

        Ok(ConversationSummary {
            id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// List the user's conversations, most recently active first.
    pub fn list(
        &self,
        user_id: Uuid,
        tenant_id: &str,
    ) -> Result<Vec<ConversationSummary>, GalleriaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, created_at, updated_at
                     FROM conversation_sessions
                     WHERE user_id = ?1 AND tenant_id = ?2
                     ORDER BY updated_at DESC",
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![user_id.to_string(), tenant_id],
                    |row| Ok(row_to_conversation(row)),
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;

            let mut conversations = Vec::new();
            for row in rows {
                let conversation = row.map_err(|e| GalleriaError::Storage(e.to_string()))??;
                conversations.push(conversation);
            }
            Ok(conversations)
        })
    }

    /// Whether the conversation exists and belongs to the given user.
    pub fn owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        tenant_id: &str,
    ) -> Result<bool, GalleriaError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM conversation_sessions
                     WHERE id = ?1 AND user_id = ?2 AND tenant_id = ?3",
                    rusqlite::params![id.to_string(), user_id.to_string(), tenant_id],
                    |row| row.get(0),
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;
            Ok(count > 0)
        })
    }

    /// Bump a conversation's last-activity timestamp.
    pub fn touch(&self, id: Uuid) -> Result<(), GalleriaError> {
        let now = Utc::now().timestamp_micros();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE conversation_sessions SET updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now, id.to_string()],
            )
            .map_err(|e| GalleriaError::Storage(e.to_string()))?;
            Ok(())
        })
    }
}

/// Repository for conversation turns.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append one turn and return its freshly minted message token.
    ///
    /// Rows are append-only; only the feedback column is ever updated later.
    pub fn append(
        &self,
        user_id: Uuid,
        tenant_id: &str,
        conversation_id: Option<Uuid>,
        role: Role,
        content: &str,
    ) -> Result<Uuid, GalleriaError> {
        let token = Uuid::new_v4();
        let now = Utc::now().timestamp_micros();

        self.db.with_conn(|conn| {
            // Timestamps are strictly monotonic per user: clamp one past the
            // newest row so paired turns written in the same microsecond
            // still sort user-before-assistant.
            let last: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(timestamp), 0) FROM messages
                     WHERE user_id = ?1 AND tenant_id = ?2",
                    rusqlite::params![user_id.to_string(), tenant_id],
                    |row| row.get(0),
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;
            let timestamp = now.max(last + 1);

            conn.execute(
                "INSERT INTO messages (user_id, tenant_id, conversation_id, content, role, timestamp, message_token)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user_id.to_string(),
                    tenant_id,
                    conversation_id.map(|c| c.to_string()),
                    content,
                    role.as_str(),
                    timestamp,
                    token.to_string(),
                ],
            )
            .map_err(|e| GalleriaError::Storage(format!("Failed to append message: {}", e)))?;
            Ok(())
        })?;

        Ok(token)
    }

    /// Retrieve the most recent `limit` turns in timestamp-ascending order.
    ///
    /// `limit` must be in 1..=[`MAX_HISTORY_LIMIT`]; violations are rejected
    /// before any query runs.
    pub fn history(
        &self,
        user_id: Uuid,
        tenant_id: &str,
        limit: u32,
    ) -> Result<Vec<Turn>, GalleriaError> {
        if limit == 0 || limit > MAX_HISTORY_LIMIT {
            return Err(GalleriaError::InvalidArgument(format!(
                "History limit must be between 1 and {}, got {}",
                MAX_HISTORY_LIMIT, limit
            )));
        }

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT role, content, timestamp, message_token, feedback FROM (
                         SELECT role, content, timestamp, message_token, feedback
                         FROM messages
                         WHERE user_id = ?1 AND tenant_id = ?2
                         ORDER BY timestamp DESC
                         LIMIT ?3
                     ) ORDER BY timestamp ASC",
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![user_id.to_string(), tenant_id, limit],
                    |row| Ok(row_to_turn(row)),
                )
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;

            let mut turns = Vec::new();
            for row in rows {
                let turn = row.map_err(|e| GalleriaError::Storage(e.to_string()))??;
                turns.push(turn);
            }
            Ok(turns)
        })
    }

    /// Record feedback for the message with the given token.
    ///
    /// Returns whether a row was found and updated; an unknown token is not
    /// an error here, the caller decides how to report it.
    pub fn set_feedback(&self, token: Uuid, value: i32) -> Result<bool, GalleriaError> {
        if !matches!(value, -1 | 0 | 1) {
            return Err(GalleriaError::InvalidArgument(format!(
                "Feedback must be -1, 0, or 1, got {}",
                value
            )));
        }

        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE messages SET feedback = ?1 WHERE message_token = ?2",
                    rusqlite::params![value, token.to_string()],
                )
                .map_err(|e| GalleriaError::Storage(format!("Failed to set feedback: {}", e)))?;
            Ok(updated > 0)
        })
    }

    /// Delete all message rows for the (user, tenant) pair.
    ///
    /// The user and tenant rows stay. Idempotent: clearing an empty history
    /// deletes nothing and succeeds.
    pub fn clear(&self, user_id: Uuid, tenant_id: &str) -> Result<u64, GalleriaError> {
        self.db.with_conn(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM messages WHERE user_id = ?1 AND tenant_id = ?2",
                    rusqlite::params![user_id.to_string(), tenant_id],
                )
                .map_err(|e| GalleriaError::Storage(format!("Failed to clear history: {}", e)))?;
            Ok(deleted as u64)
        })
    }

    /// Total message count across all users (used by the health endpoint).
    pub fn count(&self) -> Result<u64, GalleriaError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
                .map_err(|e| GalleriaError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

fn row_to_turn(row: &rusqlite::Row<'_>) -> Result<Turn, GalleriaError> {
    let role: String = row
        .get(0)
        .map_err(|e| GalleriaError::Storage(e.to_string()))?;
    let content: String = row
        .get(1)
        .map_err(|e| GalleriaError::Storage(e.to_string()))?;
    let timestamp: i64 = row
        .get(2)
        .map_err(|e| GalleriaError::Storage(e.to_string()))?;
    let token: String = row
        .get(3)
        .map_err(|e| GalleriaError::Storage(e.to_string()))?;
    let feedback: i32 = row
        .get(4)
        .map_err(|e| GalleriaError::Storage(e.to_string()))?;

    Ok(Turn {
        role: Role::parse(&role)
            .ok_or_else(|| GalleriaError::Storage(format!("Unknown role in store: {}", role)))?,
        content,
        timestamp,
        message_token: Uuid::parse_str(&token)
            .map_err(|e| GalleriaError::Storage(format!("Corrupt message token: {}", e)))?,
        feedback,
    })
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<ConversationSummary, GalleriaError> {
    let id: String = row
        .get(0)
        .map_err(|e| GalleriaError::Storage(e.to_string()))?;

    Ok(ConversationSummary {
        id: Uuid::parse_str(&id)
            .map_err(|e| GalleriaError::Storage(format!("Corrupt conversation id: {}", e)))?,
        title: row
            .get(1)
            .map_err(|e| GalleriaError::Storage(e.to_string()))?,
        created_at: row
            .get(2)
            .map_err(|e| GalleriaError::Storage(e.to_string()))?,
        updated_at: row
            .get(3)
            .map_err(|e| GalleriaError::Storage(e.to_string()))?,
    })
}
