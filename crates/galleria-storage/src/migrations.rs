//! Database schema migrations.
//!
//! Applies the tenant-scoped conversation schema: tenants, users,
//! conversation_sessions, messages, plus the schema_migrations table.

use rusqlite::Connection;
use tracing::info;

use galleria_core::error::GalleriaError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), GalleriaError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| GalleriaError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| GalleriaError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: conversation_schema");
    }

    Ok(())
}

/// Version 1: tenant-scoped conversation schema.
fn apply_v1(conn: &Connection) -> Result<(), GalleriaError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tenants (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            location    TEXT NOT NULL DEFAULT '',
            website     TEXT NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY NOT NULL,
            tenant_id   TEXT NOT NULL,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (tenant_id) REFERENCES tenants(id)
        );

        CREATE INDEX IF NOT EXISTS idx_users_tenant
            ON users (tenant_id);

        CREATE TABLE IF NOT EXISTS conversation_sessions (
            id          TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL,
            tenant_id   TEXT NOT NULL,
            title       TEXT NOT NULL DEFAULT 'New conversation',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (tenant_id) REFERENCES tenants(id)
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user
            ON conversation_sessions (user_id, tenant_id, updated_at DESC);

        -- Append-only except the feedback column. Feedback correlation goes
        -- through message_token, never the autoincrement id.
        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         TEXT NOT NULL,
            tenant_id       TEXT NOT NULL,
            conversation_id TEXT,
            content         TEXT NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('user', 'assistant')),
            timestamp       INTEGER NOT NULL,
            message_token   TEXT NOT NULL UNIQUE,
            feedback        INTEGER NOT NULL DEFAULT 0
                            CHECK (feedback IN (-1, 0, 1)),
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (tenant_id) REFERENCES tenants(id),
            FOREIGN KEY (conversation_id) REFERENCES conversation_sessions(id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user_time
            ON messages (user_id, tenant_id, timestamp ASC);

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id)
            WHERE conversation_id IS NOT NULL;

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'conversation_schema');
        ",
    )
    .map_err(|e| GalleriaError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_messages_require_existing_user() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO messages (user_id, tenant_id, content, role, timestamp, message_token)
             VALUES ('ghost', 'default', 'hello', 'user', 0, 'tok-1')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_role_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO tenants (id, name) VALUES ('t1', 'Mall')", [])
            .unwrap();
        conn.execute("INSERT INTO users (id, tenant_id) VALUES ('u1', 't1')", [])
            .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (user_id, tenant_id, content, role, timestamp, message_token)
             VALUES ('u1', 't1', 'hello', 'system', 0, 'tok-1')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_feedback_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO tenants (id, name) VALUES ('t1', 'Mall')", [])
            .unwrap();
        conn.execute("INSERT INTO users (id, tenant_id) VALUES ('u1', 't1')", [])
            .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (user_id, tenant_id, content, role, timestamp, message_token, feedback)
             VALUES ('u1', 't1', 'hello', 'user', 0, 'tok-1', 5)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_message_token_unique() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO tenants (id, name) VALUES ('t1', 'Mall')", [])
            .unwrap();
        conn.execute("INSERT INTO users (id, tenant_id) VALUES ('u1', 't1')", [])
            .unwrap();

        conn.execute(
            "INSERT INTO messages (user_id, tenant_id, content, role, timestamp, message_token)
             VALUES ('u1', 't1', 'hello', 'user', 0, 'tok-1')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (user_id, tenant_id, content, role, timestamp, message_token)
             VALUES ('u1', 't1', 'again', 'user', 1, 'tok-1')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_conversation_sessions_table() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO tenants (id, name) VALUES ('t1', 'Mall')", [])
            .unwrap();
        conn.execute("INSERT INTO users (id, tenant_id) VALUES ('u1', 't1')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO conversation_sessions (id, user_id, tenant_id, created_at, updated_at)
             VALUES ('c1', 'u1', 't1', 0, 0)",
            [],
        )
        .unwrap();

        let title: String = conn
            .query_row(
                "SELECT title FROM conversation_sessions WHERE id = 'c1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(title, "New conversation");
    }
}
