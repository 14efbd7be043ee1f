//! Workflow and activity lifecycle statuses

use serde::{Deserialize, Serialize};

/// Coarse workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// The run can still make progress
    Running,

    /// The run reached a terminal sub-status
    Finished,
}

/// Fine-grained workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowSubStatus {
    /// Created, first tick not taken yet
    Pending,

    /// A turn is in progress
    Executing,

    /// Waiting on bookmarks or external resumption
    Suspended,

    /// Completed successfully
    Finished,

    /// Ended by an unhandled activity fault
    Faulted,

    /// Ended by cancellation
    Cancelled,
}

impl WorkflowSubStatus {
    /// Whether the sub-status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Faulted | Self::Cancelled)
    }
}

/// Activity execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Created, callback not invoked yet
    Pending,

    /// Callback invoked; may be awaiting bookmarks or children
    Running,

    /// Completed
    Completed,

    /// Ended by a fault
    Faulted,

    /// Ended by cancellation
    Cancelled,
}

impl ActivityStatus {
    /// Whether the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Faulted | Self::Cancelled)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl std::fmt::Display for WorkflowSubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executing => write!(f, "executing"),
            Self::Suspended => write!(f, "suspended"),
            Self::Finished => write!(f, "finished"),
            Self::Faulted => write!(f, "faulted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Faulted => write!(f, "faulted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
