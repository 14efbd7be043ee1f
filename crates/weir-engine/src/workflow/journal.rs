//! Execution journal
//!
//! An append-only log of state transitions for a run. Entries are persisted
//! with workflow state and are usable for auditing and debugging; the
//! engine never replays them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::NodeId;
use crate::workflow::WorkflowSubStatus;

/// A state transition recorded in the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionLogEvent {
    /// The workflow took its first tick
    WorkflowStarted,

    /// The workflow suspended waiting on bookmarks or resumption
    WorkflowSuspended,

    /// The workflow reached a terminal sub-status
    WorkflowEnded { sub_status: WorkflowSubStatus },

    /// An activity was scheduled
    ActivityScheduled { node_id: NodeId },

    /// An activity callback started
    ActivityStarted { node_id: NodeId },

    /// An activity completed
    ActivityCompleted {
        node_id: NodeId,
        outcome: Option<String>,
    },

    /// An activity faulted
    ActivityFaulted { node_id: NodeId, message: String },

    /// An activity was cancelled
    ActivityCancelled { node_id: NodeId },

    /// A bookmark was created
    BookmarkCreated { bookmark_id: Uuid, name: String },

    /// A bookmark was consumed by resumption
    BookmarkBurned { bookmark_id: Uuid, name: String },

    /// An incident was recorded
    IncidentRecorded { incident_id: Uuid, message: String },
}

/// A journal entry: a timestamped event with its execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// Execution context the event belongs to, if any
    pub activity_instance_id: Option<Uuid>,

    /// When the transition happened
    pub timestamp: DateTime<Utc>,

    /// The transition
    #[serde(flatten)]
    pub event: ExecutionLogEvent,
}

impl ExecutionLogEntry {
    /// Record an event now
    pub fn new(event: ExecutionLogEvent, activity_instance_id: Option<Uuid>) -> Self {
        Self {
            activity_instance_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serialization() {
        let entry = ExecutionLogEntry::new(
            ExecutionLogEvent::ActivityCompleted {
                node_id: "seq:a".into(),
                outcome: Some("done".to_string()),
            },
            Some(Uuid::now_v7()),
        );

        let encoded = serde_json::to_string(&entry).unwrap();
        assert!(encoded.contains("\"event\":\"activity_completed\""));

        let decoded: ExecutionLogEntry = serde_json::from_str(&encoded).unwrap();
        assert_eq!(entry, decoded);
    }
}
