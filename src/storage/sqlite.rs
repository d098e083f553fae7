use crate::model::StorageError;
use crate::storage::SessionStore;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Session-scoped key/value store on SQLite. Every row belongs to one
/// `session_id`, so several browsing sessions can share one database file.
pub struct SqliteSessionStore {
    conn: Connection,
    session_id: String,
}

impl SqliteSessionStore {
    /// Opens the database and runs migrations.
    pub fn open(db_path: impl AsRef<Path>, session_id: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, session_id)
    }

    pub fn open_in_memory(session_id: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, session_id)
    }

    fn with_connection(conn: Connection, session_id: &str) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS session_entries (
                session_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (session_id, key)
            );
            ",
        )?;
        Ok(Self {
            conn,
            session_id: session_id.to_string(),
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM session_entries WHERE session_id = ?1 AND key = ?2",
                params![&self.session_id, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session_entries (session_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![&self.session_id, key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM session_entries WHERE session_id = ?1 AND key = ?2",
            params![&self.session_id, key],
        )?;
        Ok(())
    }
}
