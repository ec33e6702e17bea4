//! Session models shared across the lifecycle store, the persistence
//! bridge, and the analytics layer

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Idle,
    Running,
    Paused,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::Idle
    }
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An in-progress session held by the store while running or paused
///
/// The end time stays provisional until the session is stopped, so the
/// draft only carries the start.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDraft {
    pub name: String,
    pub subject: String,
    pub started_at: DateTime<Utc>,
}

impl SessionDraft {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            started_at,
        }
    }

    /// Finalize into a record ready for the persistence boundary
    pub fn finalize(self, end_time: DateTime<Utc>, notes: Option<String>) -> SessionRecord {
        SessionRecord {
            name: self.name,
            subject: self.subject,
            start_time: self.started_at,
            end_time,
            notes,
        }
    }
}

/// A finished session that has not been persisted yet
///
/// Serializes to the boundary wire shape: camelCase keys, ISO-8601 UTC
/// timestamps, `notes` omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub name: String,

    pub subject: String,

    /// When the session started (UTC)
    pub start_time: DateTime<Utc>,

    /// When the session ended (UTC)
    pub end_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SessionRecord {
    /// Fractional duration in hours, never rounded
    pub fn duration_hours(&self) -> f64 {
        duration_hours(self.start_time, self.end_time)
    }
}

/// A session as returned by the persistence boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Storage-assigned identifier
    pub id: i64,

    pub name: String,

    pub subject: String,

    /// When the session started (UTC)
    pub start_time: DateTime<Utc>,

    /// When the session ended (UTC)
    pub end_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StoredSession {
    /// Fractional duration in hours, never rounded
    pub fn duration_hours(&self) -> f64 {
        duration_hours(self.start_time, self.end_time)
    }

    /// Human-readable duration, e.g. "2 hours 5 minutes 1 second"
    pub fn duration_display(&self) -> String {
        format_span(self.end_time - self.start_time)
    }
}

/// Milliseconds between two instants divided by 3 600 000
pub fn duration_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

/// Humanize a span: pluralized units, zero parts omitted
pub fn format_span(span: Duration) -> String {
    let total = span.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if seconds > 0 {
        parts.push(unit(seconds, "second"));
    }

    if parts.is_empty() {
        return "0 seconds".to_string();
    }
    parts.join(" ")
}

fn unit(n: i64, name: &str) -> String {
    if n == 1 {
        format!("1 {}", name)
    } else {
        format!("{} {}s", n, name)
    }
}
