//! Lifecycle store for study sessions
//!
//! Owns the state machine (idle / running / paused), the session clock,
//! the cached collection, and the focus-mode flag. Every mutation runs
//! behind a single-slot gate, so nothing can interleave with an
//! operation that is still awaiting the persistence boundary.

use crate::bridge::StudyBridge;
use crate::clock::{Clock, ClockValue};
use crate::error::CoreError;
use crate::event::{EventBus, StudyEvent};
use crate::models::{LifecycleState, SessionDraft, StoredSession};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Configuration for the lifecycle store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Clock tick period
    pub tick_period: Duration,

    /// Event bus channel capacity
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            event_capacity: 64,
        }
    }
}

/// Lifecycle position plus the draft it owns
///
/// The draft exists exactly while a session is running or paused, so an
/// idle store can never carry stale session data.
#[derive(Debug, Clone)]
enum Lifecycle {
    Idle,
    Running(SessionDraft),
    Paused(SessionDraft),
}

impl Lifecycle {
    fn state(&self) -> LifecycleState {
        match self {
            Lifecycle::Idle => LifecycleState::Idle,
            Lifecycle::Running(_) => LifecycleState::Running,
            Lifecycle::Paused(_) => LifecycleState::Paused,
        }
    }

    fn draft(&self) -> Option<&SessionDraft> {
        match self {
            Lifecycle::Idle => None,
            Lifecycle::Running(draft) | Lifecycle::Paused(draft) => Some(draft),
        }
    }
}

/// Central store for the study tracker
///
/// Thread-safe behind `&self`; share it as `Arc<StudyStore>`. Methods
/// that spawn or touch the clock must run inside a tokio runtime.
pub struct StudyStore {
    /// Persistence boundary
    bridge: Arc<dyn StudyBridge>,

    /// State machine plus its draft
    lifecycle: RwLock<Lifecycle>,

    /// Cached collection, replaced wholesale on refresh
    sessions: RwLock<Arc<Vec<StoredSession>>>,

    /// Elapsed-time clock for the active session
    clock: Clock,

    /// Focus-mode flag, updated only after the boundary acknowledged
    focus_mode: RwLock<bool>,

    /// Single-slot gate serializing mutations
    gate: Mutex<()>,

    /// Event bus for notifying subscribers
    event_bus: EventBus,
}

impl StudyStore {
    /// Create a new store over the given persistence boundary
    pub fn new(bridge: Arc<dyn StudyBridge>, config: StoreConfig) -> Self {
        Self {
            bridge,
            lifecycle: RwLock::new(Lifecycle::Idle),
            sessions: RwLock::new(Arc::new(Vec::new())),
            clock: Clock::new(config.tick_period),
            focus_mode: RwLock::new(false),
            gate: Mutex::new(()),
            event_bus: EventBus::new(config.event_capacity),
        }
    }

    /// Create with default configuration
    pub fn with_defaults(bridge: Arc<dyn StudyBridge>) -> Self {
        Self::new(bridge, StoreConfig::default())
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to store events
    pub fn subscribe(&self) -> broadcast::Receiver<StudyEvent> {
        self.event_bus.subscribe()
    }

    /// Get current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.read().state()
    }

    /// Get the in-progress session, if any
    pub fn current_session(&self) -> Option<SessionDraft> {
        self.lifecycle.read().draft().cloned()
    }

    /// Get the cached session collection (cheap Arc clone)
    pub fn sessions(&self) -> Arc<Vec<StoredSession>> {
        Arc::clone(&self.sessions.read())
    }

    /// Snapshot of the session clock
    pub fn clock_value(&self) -> ClockValue {
        self.clock.value()
    }

    /// Whether the clock ticker is live
    pub fn is_clock_ticking(&self) -> bool {
        self.clock.is_ticking()
    }

    /// Get current focus-mode flag
    pub fn focus_mode(&self) -> bool {
        *self.focus_mode.read()
    }

    // ===================
    // Lifecycle operations
    // ===================

    /// Start a new session
    ///
    /// Rejects a name already present in the cached collection and
    /// rejects a start while a session is running or paused. Validation
    /// failures change nothing.
    pub fn start_session(&self, name: &str, subject: &str) -> Result<(), CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;

        if !matches!(*self.lifecycle.read(), Lifecycle::Idle) {
            return Err(CoreError::SessionInProgress);
        }

        if self.sessions.read().iter().any(|s| s.name == name) {
            return Err(CoreError::DuplicateName {
                name: name.to_string(),
            });
        }

        let draft = SessionDraft::new(name, subject, Utc::now());
        *self.lifecycle.write() = Lifecycle::Running(draft);
        self.clock.start();

        info!(name, subject, "Session started");
        self.event_bus
            .publish(StudyEvent::SessionStarted(name.to_string()));
        Ok(())
    }

    /// Pause the running session
    ///
    /// No-op unless a session is running.
    pub fn pause_session(&self) -> Result<(), CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;

        {
            let mut lifecycle = self.lifecycle.write();
            match &*lifecycle {
                Lifecycle::Running(draft) => {
                    *lifecycle = Lifecycle::Paused(draft.clone());
                }
                _ => return Ok(()),
            }
        }

        self.clock.pause();
        debug!("Session paused");
        self.event_bus.publish(StudyEvent::SessionPaused);
        Ok(())
    }

    /// Resume the paused session
    ///
    /// No-op unless a session is paused.
    pub fn resume_session(&self) -> Result<(), CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;

        {
            let mut lifecycle = self.lifecycle.write();
            match &*lifecycle {
                Lifecycle::Paused(draft) => {
                    *lifecycle = Lifecycle::Running(draft.clone());
                }
                _ => return Ok(()),
            }
        }

        self.clock.start();
        debug!("Session resumed");
        self.event_bus.publish(StudyEvent::SessionResumed);
        Ok(())
    }

    /// Stop the active session and persist it
    ///
    /// Finalizes the draft and awaits the boundary's acknowledgment
    /// before any state changes. A refused ack leaves the session
    /// running (or paused) with the clock intact, so the caller can
    /// retry. No-op while idle.
    pub async fn stop_session(&self, notes: Option<String>) -> Result<(), CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;

        let draft = {
            let lifecycle = self.lifecycle.read();
            match lifecycle.draft() {
                Some(draft) => draft.clone(),
                None => return Ok(()),
            }
        };

        let record = draft.finalize(Utc::now(), notes);
        let payload = serde_json::to_string(&record)?;

        if !self.bridge.create_session(&payload).await {
            warn!(name = %record.name, "Bridge refused to persist session");
            return Err(CoreError::Bridge {
                operation: "createSession",
            });
        }

        *self.lifecycle.write() = Lifecycle::Idle;
        self.clock.stop();

        if let Err(e) = self.refresh_cache().await {
            // The record is already durable; the cache catches up on the
            // next refresh
            warn!(error = %e, "Session refresh after stop failed");
        }

        info!(name = %record.name, hours = record.duration_hours(), "Session completed");
        self.event_bus
            .publish(StudyEvent::SessionCompleted(record.name.clone()));
        Ok(())
    }

    // ===================
    // Collection operations
    // ===================

    /// Delete a stored session
    ///
    /// Rejects an id absent from the cached collection before touching
    /// the boundary.
    pub async fn delete_session(&self, id: i64) -> Result<(), CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;

        if !self.sessions.read().iter().any(|s| s.id == id) {
            return Err(CoreError::SessionNotFound { id });
        }

        if !self.bridge.delete_session(id).await {
            warn!(id, "Bridge refused to delete session");
            return Err(CoreError::Bridge {
                operation: "deleteSession",
            });
        }

        if let Err(e) = self.refresh_cache().await {
            warn!(error = %e, "Session refresh after delete failed");
        }

        info!(id, "Session deleted");
        self.event_bus.publish(StudyEvent::SessionDeleted(id));
        Ok(())
    }

    /// Reload the cached collection from the boundary
    pub async fn refresh_sessions(&self) -> Result<usize, CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;
        self.refresh_cache().await
    }

    /// Toggle focus mode through the boundary
    ///
    /// The flag only changes after the boundary acknowledged the toggle.
    pub async fn set_focus_mode(&self, enabled: bool) -> Result<(), CoreError> {
        let _gate = self.gate.try_lock().map_err(|_| CoreError::OperationPending)?;

        let acknowledged = if enabled {
            self.bridge.enable_do_not_disturb().await
        } else {
            self.bridge.disable_do_not_disturb().await
        };

        if !acknowledged {
            warn!(enabled, "Bridge refused focus mode change");
            return Err(CoreError::Bridge {
                operation: if enabled {
                    "enableDoNotDisturb"
                } else {
                    "disableDoNotDisturb"
                },
            });
        }

        *self.focus_mode.write() = enabled;
        debug!(enabled, "Focus mode changed");
        self.event_bus.publish(StudyEvent::FocusModeChanged(enabled));
        Ok(())
    }

    /// Fetch, parse, and swap in the session collection
    ///
    /// Callers must already hold the gate.
    async fn refresh_cache(&self) -> Result<usize, CoreError> {
        let payload = self.bridge.get_all_sessions().await;
        let sessions: Vec<StoredSession> = serde_json::from_str(&payload)?;
        let count = sessions.len();

        *self.sessions.write() = Arc::new(sessions);
        debug!(count, "Sessions refreshed");
        self.event_bus.publish(StudyEvent::SessionsRefreshed(count));
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionRecord;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    /// In-memory bridge with switchable failure modes
    #[derive(Default)]
    struct TestBridge {
        rows: SyncMutex<Vec<StoredSession>>,
        next_id: AtomicI64,
        fail_create: AtomicBool,
        fail_delete: AtomicBool,
        fail_dnd: AtomicBool,
        garbage_list: AtomicBool,
        create_gate: Arc<Mutex<()>>,
    }

    #[async_trait]
    impl StudyBridge for TestBridge {
        async fn create_session(&self, session_json: &str) -> bool {
            let _held = self.create_gate.lock().await;
            if self.fail_create.load(Ordering::SeqCst) {
                return false;
            }
            let record: SessionRecord = match serde_json::from_str(session_json) {
                Ok(record) => record,
                Err(_) => return false,
            };
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.rows.lock().push(StoredSession {
                id,
                name: record.name,
                subject: record.subject,
                start_time: record.start_time,
                end_time: record.end_time,
                notes: record.notes,
            });
            true
        }

        async fn get_all_sessions(&self) -> String {
            if self.garbage_list.load(Ordering::SeqCst) {
                return "not json".to_string();
            }
            serde_json::to_string(&*self.rows.lock()).unwrap_or_else(|_| "[]".to_string())
        }

        async fn delete_session(&self, id: i64) -> bool {
            if self.fail_delete.load(Ordering::SeqCst) {
                return false;
            }
            let mut rows = self.rows.lock();
            let before = rows.len();
            rows.retain(|s| s.id != id);
            rows.len() < before
        }

        async fn enable_do_not_disturb(&self) -> bool {
            !self.fail_dnd.load(Ordering::SeqCst)
        }

        async fn disable_do_not_disturb(&self) -> bool {
            !self.fail_dnd.load(Ordering::SeqCst)
        }
    }

    fn test_store() -> (Arc<TestBridge>, StudyStore) {
        let bridge = Arc::new(TestBridge::default());
        let store = StudyStore::with_defaults(bridge.clone());
        (bridge, store)
    }

    async fn advance_secs(n: u64) {
        for _ in 0..n {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_start_requires_idle() {
        let (_bridge, store) = test_store();

        store.start_session("Algebra review", "Math").unwrap();
        assert_eq!(store.state(), LifecycleState::Running);
        assert_eq!(store.current_session().unwrap().name, "Algebra review");

        let err = store.start_session("Essay outline", "History").unwrap_err();
        assert!(matches!(err, CoreError::SessionInProgress));
        assert_eq!(store.current_session().unwrap().name, "Algebra review");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_without_state_change() {
        let (bridge, store) = test_store();
        bridge
            .create_session(
                &serde_json::to_string(&SessionRecord {
                    name: "Algebra review".to_string(),
                    subject: "Math".to_string(),
                    start_time: Utc::now(),
                    end_time: Utc::now(),
                    notes: None,
                })
                .unwrap(),
            )
            .await;
        store.refresh_sessions().await.unwrap();

        let err = store.start_session("Algebra review", "Math").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { name } if name == "Algebra review"));
        assert_eq!(store.state(), LifecycleState::Idle);
        assert!(!store.is_clock_ticking());
        assert!(store.clock_value().is_zero());

        store.start_session("Algebra review II", "Math").unwrap();
        assert_eq!(store.state(), LifecycleState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_cycle() {
        let (_bridge, store) = test_store();

        // Pausing or resuming while idle changes nothing
        store.pause_session().unwrap();
        store.resume_session().unwrap();
        assert_eq!(store.state(), LifecycleState::Idle);

        store.start_session("Flashcards", "Spanish").unwrap();
        advance_secs(2).await;

        store.pause_session().unwrap();
        assert_eq!(store.state(), LifecycleState::Paused);
        assert!(!store.is_clock_ticking());

        advance_secs(30).await;
        assert_eq!(store.clock_value().total_seconds(), 2);

        store.resume_session().unwrap();
        assert_eq!(store.state(), LifecycleState::Running);
        advance_secs(1).await;
        assert_eq!(store.clock_value().total_seconds(), 3);
    }

    #[tokio::test]
    async fn test_stop_persists_and_resets() {
        let (bridge, store) = test_store();

        store.start_session("Essay outline", "History").unwrap();
        store
            .stop_session(Some("intro done".to_string()))
            .await
            .unwrap();

        assert_eq!(store.state(), LifecycleState::Idle);
        assert!(store.current_session().is_none());
        assert!(store.clock_value().is_zero());
        assert!(!store.is_clock_ticking());

        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].name, "Essay outline");
        assert_eq!(sessions[0].notes.as_deref(), Some("intro done"));
        assert_eq!(bridge.rows.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_noop() {
        let (bridge, store) = test_store();

        store.stop_session(None).await.unwrap();
        assert_eq!(store.state(), LifecycleState::Idle);
        assert!(bridge.rows.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stop_keeps_state_and_clock() {
        let (bridge, store) = test_store();
        bridge.fail_create.store(true, Ordering::SeqCst);

        store.start_session("Problem set 4", "Physics").unwrap();
        advance_secs(2).await;

        let err = store.stop_session(None).await.unwrap_err();
        assert!(matches!(err, CoreError::Bridge { operation: "createSession" }));
        assert_eq!(store.state(), LifecycleState::Running);
        assert_eq!(store.current_session().unwrap().name, "Problem set 4");
        assert_eq!(store.clock_value().total_seconds(), 2);
        assert!(store.is_clock_ticking());

        // Retry succeeds once the boundary recovers
        bridge.fail_create.store(false, Ordering::SeqCst);
        store.stop_session(None).await.unwrap();
        assert_eq!(store.state(), LifecycleState::Idle);
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_prechecks_cached_collection() {
        let (bridge, store) = test_store();
        bridge.fail_delete.store(true, Ordering::SeqCst);

        // Unknown id fails before the boundary is consulted
        let err = store.delete_session(42).await.unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound { id: 42 }));
    }

    #[tokio::test]
    async fn test_delete_removes_and_refreshes() {
        let (bridge, store) = test_store();

        store.start_session("Algebra review", "Math").unwrap();
        store.stop_session(None).await.unwrap();
        store.start_session("Geometry drills", "Math").unwrap();
        store.stop_session(None).await.unwrap();
        assert_eq!(store.sessions().len(), 2);

        let first_id = store.sessions()[0].id;
        store.delete_session(first_id).await.unwrap();

        assert_eq!(store.sessions().len(), 1);
        assert_eq!(bridge.rows.lock().len(), 1);

        // Boundary refusal surfaces as a bridge error
        bridge.fail_delete.store(true, Ordering::SeqCst);
        let remaining = store.sessions()[0].id;
        let err = store.delete_session(remaining).await.unwrap_err();
        assert!(matches!(err, CoreError::Bridge { operation: "deleteSession" }));
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_focus_mode_follows_boundary_ack() {
        let (bridge, store) = test_store();
        assert!(!store.focus_mode());

        store.set_focus_mode(true).await.unwrap();
        assert!(store.focus_mode());

        bridge.fail_dnd.store(true, Ordering::SeqCst);
        let err = store.set_focus_mode(false).await.unwrap_err();
        assert!(matches!(err, CoreError::Bridge { .. }));
        // Flag unchanged after a refused toggle
        assert!(store.focus_mode());
    }

    #[tokio::test]
    async fn test_refresh_rejects_malformed_payload() {
        let (bridge, store) = test_store();

        store.start_session("Algebra review", "Math").unwrap();
        store.stop_session(None).await.unwrap();
        assert_eq!(store.sessions().len(), 1);

        bridge.garbage_list.store(true, Ordering::SeqCst);
        let err = store.refresh_sessions().await.unwrap_err();
        assert!(matches!(err, CoreError::Payload { .. }));
        // Cache untouched
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_gate_rejects_overlapping_operations() {
        let (bridge, store) = test_store();
        let store = Arc::new(store);

        store.start_session("Algebra review", "Math").unwrap();

        // Hold the bridge so the stop stays in flight
        let held = bridge.create_gate.clone().lock_owned().await;

        let stopping = tokio::spawn({
            let store = store.clone();
            async move { store.stop_session(None).await }
        });
        tokio::task::yield_now().await;

        assert!(matches!(
            store.pause_session(),
            Err(CoreError::OperationPending)
        ));
        assert!(matches!(
            store.start_session("Essay outline", "History"),
            Err(CoreError::OperationPending)
        ));
        assert!(matches!(
            store.delete_session(1).await,
            Err(CoreError::OperationPending)
        ));

        drop(held);
        stopping.await.unwrap().unwrap();
        assert_eq!(store.state(), LifecycleState::Idle);
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let (_bridge, store) = test_store();
        let mut rx = store.subscribe();

        store.start_session("Flashcards", "Spanish").unwrap();
        store.pause_session().unwrap();
        store.resume_session().unwrap();
        store.stop_session(None).await.unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            StudyEvent::SessionStarted(name) if name == "Flashcards"
        ));
        assert!(matches!(rx.recv().await.unwrap(), StudyEvent::SessionPaused));
        assert!(matches!(rx.recv().await.unwrap(), StudyEvent::SessionResumed));
        assert!(matches!(
            rx.recv().await.unwrap(),
            StudyEvent::SessionsRefreshed(1)
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            StudyEvent::SessionCompleted(name) if name == "Flashcards"
        ));
    }
}
