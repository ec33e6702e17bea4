//! Derived statistics over the stored collection
//!
//! Pure functions with no clock reads. The caller supplies "today" so
//! streaks stay deterministic under test.

use crate::models::StoredSession;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Sum of fractional hours across all sessions
pub fn total_study_hours(sessions: &[StoredSession]) -> f64 {
    sessions.iter().map(|s| s.duration_hours()).sum()
}

/// Number of stored sessions
pub fn total_sessions(sessions: &[StoredSession]) -> usize {
    sessions.len()
}

/// Average session length in hours, rounded to the nearest whole hour
///
/// Zero for an empty collection, so there is never a division by zero.
pub fn average_session_hours(sessions: &[StoredSession]) -> f64 {
    if sessions.is_empty() {
        return 0.0;
    }
    (total_study_hours(sessions) / sessions.len() as f64).round()
}

/// Consecutive days with at least one session, counting back from today
///
/// Zero when today has no session, regardless of earlier activity. Days
/// are UTC dates of session starts.
pub fn current_streak(sessions: &[StoredSession], today: NaiveDate) -> u32 {
    let active_days: HashSet<NaiveDate> = sessions
        .iter()
        .map(|s| s.start_time.date_naive())
        .collect();

    let mut streak = 0;
    let mut cursor = today;
    while active_days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

/// The dashboard's four summary numbers
#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    pub total_hours: f64,
    pub total_sessions: usize,
    pub average_hours: f64,
    pub streak_days: u32,
}

impl StudySummary {
    /// Compute all four statistics for the collection
    pub fn compute(sessions: &[StoredSession], today: NaiveDate) -> Self {
        Self {
            total_hours: total_study_hours(sessions),
            total_sessions: total_sessions(sessions),
            average_hours: average_session_hours(sessions),
            streak_days: current_streak(sessions, today),
        }
    }
}
