//! SQLite persistence for completed study sessions
//!
//! Schema:
//! - sessions table: one row per completed session, timestamps as RFC 3339 text
//! - Indexes: subject, start_time for filtered and ordered queries
//!
//! Timestamps are stored as UTC text so rows stay readable with the
//! sqlite3 CLI and sort correctly as strings.

use crate::models::{SessionRecord, StoredSession};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

/// SQLite-backed session store (thread-safe)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                subject TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                notes TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_subject ON sessions(subject);
            CREATE INDEX IF NOT EXISTS idx_start_time ON sessions(start_time);
            "#,
        )
        .context("Failed to create schema")?;

        debug!(path = %path.display(), "Study database initialized");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a completed session and return its row id
    pub fn insert_session(&self, record: &SessionRecord) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO sessions (name, subject, start_time, end_time, notes)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                record.name.as_str(),
                record.subject.as_str(),
                record.start_time.to_rfc3339(),
                record.end_time.to_rfc3339(),
                record.notes.as_deref(),
            ],
        )
        .context("Failed to insert session")?;

        let id = conn.last_insert_rowid();
        debug!(id, name = %record.name, "Session persisted");
        Ok(id)
    }

    /// All sessions, most recent start first
    pub fn all_sessions(&self) -> Result<Vec<StoredSession>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, name, subject, start_time, end_time, notes
                FROM sessions
                ORDER BY start_time DESC
                "#,
            )
            .context("Failed to prepare query")?;

        let rows = stmt
            .query_map([], |row| {
                let start_raw: String = row.get(3)?;
                let end_raw: String = row.get(4)?;
                Ok(StoredSession {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    subject: row.get(2)?,
                    start_time: parse_timestamp(3, &start_raw)?,
                    end_time: parse_timestamp(4, &end_raw)?,
                    notes: row.get(5)?,
                })
            })
            .context("Failed to query sessions")?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row.context("Failed to read row")?);
        }

        Ok(sessions)
    }

    /// Delete by id, reporting whether a row was removed
    pub fn delete_session(&self, id: i64) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;

        let changes = conn
            .execute("DELETE FROM sessions WHERE id = ?", params![id])
            .context("Failed to delete session")?;

        debug!(id, deleted = changes > 0, "Delete executed");
        Ok(changes > 0)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // WAL checkpoint on drop so data lands in the main database file
        // and the WAL file doesn't grow unbounded across restarts
        if let Ok(conn) = self.conn.lock() {
            if let Err(e) = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
                warn!("Failed to checkpoint WAL on Database drop: {}", e);
            }
        }
    }
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
