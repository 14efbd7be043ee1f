//! Engine error types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persistence::CommitError;

/// Errors surfaced by the engine to callers
///
/// Seeding errors (`ActivityNotFound`, `ContextNotFound`, `BookmarkNotFound`)
/// fail the call synchronously without mutating state. Faults raised inside
/// activity callbacks never appear here; they are captured as incidents on
/// the workflow execution context.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Resumption targeted an activity not present in the graph
    #[error("activity not found: {0}")]
    ActivityNotFound(String),

    /// Resumption targeted an activity execution context not present in state
    #[error("activity execution context not found: {0}")]
    ContextNotFound(Uuid),

    /// Resumption targeted a bookmark that is not persisted
    #[error("bookmark not found: {0}")]
    BookmarkNotFound(Uuid),

    /// Persisted state is newer than the engine's known format
    #[error("state format version {found} is newer than supported version {supported}")]
    StateVersionMismatch { found: u32, supported: u32 },

    /// Scheduling targeted an activity not reachable in the graph
    #[error("schedule rejected: node {0} is not part of the workflow graph")]
    ScheduleRejected(String),

    /// Mutually exclusive run options were supplied together
    #[error("invalid run options: {0}")]
    InvalidOptions(String),

    /// Committing the extracted state failed
    #[error("commit failed: {0}")]
    Commit(#[from] CommitError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fault raised by an activity callback
///
/// Faults are serializable payloads, not engine errors: the per-activity
/// pipeline traps them, records an incident, and applies the configured
/// fault strategy. The `kind` field is a free-form code for programmatic
/// handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityFault {
    /// Human-readable fault message
    pub message: String,

    /// Fault code for programmatic handling
    pub kind: Option<String>,
}

impl ActivityFault {
    /// Create a new fault
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
        }
    }

    /// Set the fault kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl std::fmt::Display for ActivityFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActivityFault {}

impl From<anyhow::Error> for ActivityFault {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for ActivityFault {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string()).with_kind("serialization")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_display() {
        let fault = ActivityFault::new("boom");
        assert_eq!(fault.to_string(), "boom");
    }

    #[test]
    fn test_fault_with_kind() {
        let fault = ActivityFault::new("missing input").with_kind("bad_input");
        assert_eq!(fault.kind, Some("bad_input".to_string()));
    }

    #[test]
    fn test_fault_from_anyhow() {
        let err = anyhow::anyhow!("wrapped");
        let fault: ActivityFault = err.into();
        assert_eq!(fault.message, "wrapped");
    }
}
