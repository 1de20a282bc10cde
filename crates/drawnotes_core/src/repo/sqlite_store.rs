//! SQLite-backed snapshot storage.
//!
//! # Responsibility
//! - Persist the serialized drawing store as one blob row keyed by location.
//!
//! # Invariants
//! - The connection has migrations applied before it is wrapped.
//! - Writes upsert a single row; there is never more than one snapshot per key.

use crate::db::{open_db, open_db_in_memory};
use crate::repo::backend::{BackendError, BackendResult, PersistenceBackend, SAVE_FILE_NAME};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Snapshot storage inside a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    key: String,
}

impl SqliteStore {
    /// Opens `path` and binds to the fixed save key.
    pub fn open(path: impl AsRef<Path>) -> BackendResult<Self> {
        Ok(Self::with_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> BackendResult<Self> {
        Ok(Self::with_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            key: SAVE_FILE_NAME.to_string(),
        }
    }

    fn query_payload(&self) -> rusqlite::Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT payload FROM snapshots WHERE location = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()
    }
}

impl PersistenceBackend for SqliteStore {
    fn location(&self) -> String {
        format!("sqlite://{}", self.key)
    }

    fn exists(&self) -> bool {
        match self.query_payload() {
            Ok(payload) => payload.is_some(),
            Err(err) => {
                warn!(
                    "event=snapshot_exists module=repo status=error location={} error={}",
                    self.location(),
                    err
                );
                false
            }
        }
    }

    fn read(&self) -> BackendResult<Vec<u8>> {
        self.query_payload()?
            .ok_or_else(|| BackendError::NotFound(self.location()))
    }

    fn write(&mut self, bytes: &[u8]) -> BackendResult<()> {
        self.conn.execute(
            "INSERT INTO snapshots (location, payload) VALUES (?1, ?2)
             ON CONFLICT(location) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), bytes],
        )?;
        Ok(())
    }
}
