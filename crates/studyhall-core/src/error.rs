//! Error types for studyhall-core
//!
//! Validation failures, the in-flight operation gate, and rejected
//! boundary calls each get their own class so hosts can pick the right
//! presentation. Boundary failures are never fatal.

use thiserror::Error;

/// Core error type for studyhall operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Validation Errors
    // ===================
    #[error("A session named {name:?} already exists")]
    DuplicateName { name: String },

    #[error("A session is already in progress")]
    SessionInProgress,

    #[error("Session not found: {id}")]
    SessionNotFound { id: i64 },

    // ===================
    // Concurrency Errors
    // ===================
    #[error("Another operation is still in flight")]
    OperationPending,

    // ===================
    // Boundary Errors
    // ===================
    #[error("Bridge rejected {operation}")]
    Bridge { operation: &'static str },

    // ===================
    // Serialization Errors
    // ===================
    #[error("Malformed session payload")]
    Payload {
        #[from]
        source: serde_json::Error,
    },
}

impl CoreError {
    /// True for failures rejected before any state change
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateName { .. }
                | CoreError::SessionInProgress
                | CoreError::SessionNotFound { .. }
        )
    }

    /// True when the persistence boundary answered false
    pub fn is_bridge(&self) -> bool {
        matches!(self, CoreError::Bridge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(CoreError::DuplicateName {
            name: "Algebra".to_string()
        }
        .is_validation());
        assert!(CoreError::SessionNotFound { id: 9 }.is_validation());
        assert!(CoreError::Bridge {
            operation: "createSession"
        }
        .is_bridge());
        assert!(!CoreError::OperationPending.is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::DuplicateName {
            name: "Algebra".to_string(),
        };
        assert_eq!(err.to_string(), "A session named \"Algebra\" already exists");

        let err = CoreError::Bridge {
            operation: "deleteSession",
        };
        assert_eq!(err.to_string(), "Bridge rejected deleteSession");
    }
}
