//! Native persistence and platform integration
//!
//! [`NativeBridge`] implements [`StudyBridge`] over a local SQLite file
//! plus the platform do-not-disturb hooks. Failures are logged here and
//! flattened to the boundary's `false` / `"[]"` forms, so the store never
//! sees a panic from this side.

pub mod db;
pub mod dnd;

pub use db::Database;

use crate::bridge::StudyBridge;
use crate::models::SessionRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Platform data directory for the study database
///
/// Falls back to the temp directory on systems without a conventional
/// per-user data location.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("studyhall")
}

/// [`StudyBridge`] backed by local SQLite and desktop notification controls
pub struct NativeBridge {
    db: Database,
}

impl NativeBridge {
    /// Open the bridge with its database under `data_dir`, creating the
    /// directory if needed
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;

        let db = Database::open(&data_dir.join("studyhall.db"))?;
        Ok(Self { db })
    }

    /// Open the bridge in [`default_data_dir`]
    pub fn open_default() -> Result<Self> {
        Self::open(&default_data_dir())
    }
}

#[async_trait]
impl StudyBridge for NativeBridge {
    async fn create_session(&self, session_json: &str) -> bool {
        let record: SessionRecord = match serde_json::from_str(session_json) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Rejected malformed session payload");
                return false;
            }
        };

        match self.db.insert_session(&record) {
            Ok(id) => {
                debug!(id, name = %record.name, "Session created");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to store session");
                false
            }
        }
    }

    async fn get_all_sessions(&self) -> String {
        let sessions = match self.db.all_sessions() {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "Failed to load sessions");
                return "[]".to_string();
            }
        };

        match serde_json::to_string(&sessions) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode sessions");
                "[]".to_string()
            }
        }
    }

    async fn delete_session(&self, id: i64) -> bool {
        match self.db.delete_session(id) {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(error = %e, id, "Failed to delete session");
                false
            }
        }
    }

    async fn enable_do_not_disturb(&self) -> bool {
        dnd::set_do_not_disturb(true)
    }

    async fn disable_do_not_disturb(&self) -> bool {
        dnd::set_do_not_disturb(false)
    }
}
