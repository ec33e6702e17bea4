//! Event bus for studyhall using tokio::broadcast
//!
//! Lets a host drive toasts and view refreshes off store mutations
//! without polling.

use tokio::sync::broadcast;

/// Events emitted by the lifecycle store
#[derive(Debug, Clone)]
pub enum StudyEvent {
    /// A session started running
    SessionStarted(String),
    /// The running session was paused
    SessionPaused,
    /// The paused session resumed
    SessionResumed,
    /// A session was finalized and persisted
    SessionCompleted(String),
    /// A stored session was deleted
    SessionDeleted(i64),
    /// The cached collection was reloaded from the boundary
    SessionsRefreshed(usize),
    /// Focus mode was toggled
    FocusModeChanged(bool),
}

/// Event bus for broadcasting store events
///
/// Uses tokio::broadcast for multi-consumer support.
pub struct EventBus {
    sender: broadcast::Sender<StudyEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (64 events)
    pub fn default_capacity() -> Self {
        Self::new(64)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: StudyEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<StudyEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::default_capacity();
        let mut rx = bus.subscribe();

        bus.publish(StudyEvent::SessionStarted("Algebra review".to_string()));
        bus.publish(StudyEvent::SessionsRefreshed(3));

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, StudyEvent::SessionStarted(name) if name == "Algebra review"));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(event2, StudyEvent::SessionsRefreshed(3)));
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::default_capacity();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(StudyEvent::FocusModeChanged(true));

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();

        assert!(matches!(e1, StudyEvent::FocusModeChanged(true)));
        assert!(matches!(e2, StudyEvent::FocusModeChanged(true)));
    }

    #[test]
    fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::default_capacity();
        // Should not panic even with no subscribers
        bus.publish(StudyEvent::SessionPaused);
    }
}
