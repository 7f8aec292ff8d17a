//! SQLite-backed keyed store.
//!
//! The file lives at `~/.momentum/momentum.db` unless the config points
//! elsewhere. One `kv_store` row per key; `set_many` writes all of its rows
//! inside a single transaction.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{KeyedStore, StoreError};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `~/.momentum/momentum.db`.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(Self::default_path()?)
    }

    /// Open a store at an explicit path. Useful for testing.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory store with the full schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let applied = crate::migrations::run_migrations(&conn).map_err(StoreError::Migration)?;
        if applied > 0 {
            log::debug!("Store schema upgraded ({} migrations)", applied);
        }
        Ok(Self { conn })
    }

    fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::HomeDirNotFound)?;
        Ok(home.join(".momentum").join("momentum.db"))
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }
}

impl KeyedStore for SqliteStore {
    fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    log::warn!("Corrupt JSON under {key}: {e}");
                    Ok(None)
                }
            },
        }
    }

    fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
            )?;
            for (key, value) in &entries {
                let text = serde_json::to_string(value)?;
                stmt.execute(params![key, text, now])?;
            }
        }
        // Dropping `tx` on an early return above rolls everything back.
        tx.commit()?;
        log::debug!("Committed {} store slots", entries.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}
