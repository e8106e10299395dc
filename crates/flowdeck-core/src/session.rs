//! Session persistence
//!
//! The whole session ({dna, tasks}) is one JSON record stored under a single
//! key in a small SQLite key/value table.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::dna::ProjectDna;
use crate::task::MicroTask;

pub const STORAGE_KEY: &str = "flowdeck.session";

/// Everything that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub dna: Option<ProjectDna>,
    #[serde(default)]
    pub tasks: Vec<MicroTask>,
}

impl Session {
    pub fn task(&self, id: &str) -> Option<&MicroTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut MicroTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("could not create storage directory: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [STORAGE_KEY], |row| row.get(0))
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        let json = serde_json::to_string(session)?;
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![STORAGE_KEY, json, chrono::Utc::now().timestamp_millis()],
        )?;
        tracing::debug!(tasks = session.tasks.len(), bytes = json.len(), "Session saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [STORAGE_KEY])?;
        Ok(())
    }
}
