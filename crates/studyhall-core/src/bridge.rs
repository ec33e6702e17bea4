//! Persistence boundary for the lifecycle store
//!
//! Everything durable or platform-specific sits behind this trait so the
//! core stays testable and hosts can swap the backing implementation.

use async_trait::async_trait;

/// Async boundary between the store and its host environment
///
/// Failures cross the boundary as booleans (or an empty collection), never
/// as panics. The store maps a `false` acknowledgment to
/// [`CoreError::Bridge`](crate::error::CoreError::Bridge) and leaves its
/// own state untouched.
#[async_trait]
pub trait StudyBridge: Send + Sync {
    /// Persist a finalized session, passed as its JSON wire form
    ///
    /// Returns whether the record was durably stored.
    async fn create_session(&self, session_json: &str) -> bool;

    /// Fetch every stored session as a JSON array, newest first
    ///
    /// Implementations return `"[]"` when retrieval fails.
    async fn get_all_sessions(&self) -> String;

    /// Delete a stored session, returning whether a record was removed
    async fn delete_session(&self, id: i64) -> bool;

    /// Suppress desktop notifications
    async fn enable_do_not_disturb(&self) -> bool;

    /// Restore desktop notifications
    async fn disable_do_not_disturb(&self) -> bool;
}
