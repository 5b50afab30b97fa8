use std::{path::Path, sync::Mutex, sync::MutexGuard};

use rusqlite::Connection;
use tracing::info;

use postbox_core::{Error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS msg_map (
    message_id INTEGER PRIMARY KEY,
    chat_id    TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_msg_map_created_at ON msg_map(created_at);

CREATE TABLE IF NOT EXISTS blocked_users (
    chat_id    TEXT PRIMARY KEY,
    is_blocked INTEGER NOT NULL DEFAULT 1,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS fraud_users (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_fraud_users_created_at ON fraud_users(created_at);
";

/// SQLite-backed store. The connection sits behind a mutex; statements are
/// short-lived, so contention stays negligible at this bot's traffic.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!(path = %path.display(), "database opened");
        Ok(store)
    }

    /// In-memory database, used by tests and the debug init endpoint.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create any missing tables. Safe to call repeatedly.
    pub fn init_schema(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA).map_err(db_err)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // Poisoning only happens after a panic in another statement, at
        // which point continuing with the same data is still sound.
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    Error::Store(e.to_string())
}
