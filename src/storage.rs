//! Persistent key-value storage for the durable subset of store state.
//!
//! One SQLite table maps a logical store name ("job-storage", "user-storage")
//! to a serialized JSON blob. Stores load their blob once at startup and
//! rewrite it on every mutating command; write failures are the caller's to
//! log, never to propagate into the UI flow.

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(Self::default_path())
    }

    pub fn open_at(path: PathBuf) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, used by tests and as a degraded fallback when the
    /// on-disk database cannot be opened.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn default_path() -> PathBuf {
        // XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "platsjakt") {
            proj_dirs.data_dir().join("platsjakt.db")
        } else {
            PathBuf::from("platsjakt.db")
        }
    }

    fn init(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                name TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO kv_store (name, data, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(name) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![name, data],
        )?;
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let result = self.conn.query_row(
            "SELECT data FROM kv_store WHERE name = ?1",
            [name],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
