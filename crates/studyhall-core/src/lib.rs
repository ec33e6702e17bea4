//! studyhall-core - Core library for the Studyhall session tracker
//!
//! Provides the session lifecycle store, elapsed-time clock, calendar
//! analytics, and the native SQLite backend.

pub mod analytics;
pub mod backend;
pub mod bridge;
pub mod clock;
pub mod error;
pub mod event;
pub mod models;
pub mod store;

pub use backend::NativeBridge;
pub use bridge::StudyBridge;
pub use error::CoreError;
pub use event::{EventBus, StudyEvent};
pub use store::{StoreConfig, StudyStore};
