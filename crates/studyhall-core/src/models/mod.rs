//! Data models for studyhall

pub mod session;

pub use session::{
    duration_hours, format_span, LifecycleState, SessionDraft, SessionRecord, StoredSession,
};
