//! Activity execution context

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::graph::NodeId;
use crate::memory::MemoryRegister;
use crate::workflow::ActivityStatus;

/// Runtime state for one in-flight activity execution
///
/// Contexts live in a flat table on the workflow execution context, keyed
/// by id and linked by `parent_id`; navigation is by lookup, never by
/// back-pointer. `is_executing` is true while the activity owns
/// uncompleted work, including while it waits on bookmarks or children.
#[derive(Debug, Clone)]
pub struct ActivityExecutionContext {
    /// Unique id of this execution
    pub id: Uuid,

    /// Node being executed
    pub node_id: NodeId,

    /// Parent execution context; `None` for the root
    pub parent_id: Option<Uuid>,

    /// Lifecycle status
    pub status: ActivityStatus,

    /// Whether the activity owns uncompleted work
    pub is_executing: bool,

    /// Tag from the node or the scheduling work item
    pub tag: Option<String>,

    /// Completion outcome, used to key parent continuations
    pub outcome: Option<String>,

    /// Effective input: node literals merged with work-item overrides
    pub input: Map<String, Value>,

    /// Outputs produced by the activity
    pub output: Map<String, Value>,

    /// Free-form runtime properties (composite cursors live here)
    pub properties: Map<String, Value>,

    /// Local memory register
    pub register: MemoryRegister,

    /// When the context was created
    pub started_at: DateTime<Utc>,

    /// When the context reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

impl ActivityExecutionContext {
    /// Create a pending context
    pub fn new(id: Uuid, node_id: NodeId, parent_id: Option<Uuid>) -> Self {
        Self {
            id,
            node_id,
            parent_id,
            status: ActivityStatus::Pending,
            is_executing: false,
            tag: None,
            outcome: None,
            input: Map::new(),
            output: Map::new(),
            properties: Map::new(),
            register: MemoryRegister::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Whether the context reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition to `Running` and take ownership of work
    pub fn mark_running(&mut self) {
        self.status = ActivityStatus::Running;
        self.is_executing = true;
    }

    /// Transition to `Completed` with an optional outcome
    pub fn mark_completed(&mut self, outcome: Option<String>) {
        self.status = ActivityStatus::Completed;
        self.outcome = outcome;
        self.is_executing = false;
        self.completed_at = Some(Utc::now());
    }

    /// Transition to `Faulted`
    pub fn mark_faulted(&mut self) {
        self.status = ActivityStatus::Faulted;
        self.is_executing = false;
        self.completed_at = Some(Utc::now());
    }

    /// Transition to `Cancelled`
    pub fn mark_cancelled(&mut self) {
        self.status = ActivityStatus::Cancelled;
        self.is_executing = false;
        self.completed_at = Some(Utc::now());
    }

    /// Read a runtime property
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Write a runtime property
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Read an input value
    pub fn input_value(&self, name: &str) -> Option<&Value> {
        self.input.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lifecycle_transitions() {
        let mut aec = ActivityExecutionContext::new(Uuid::now_v7(), "seq:a".into(), None);
        assert_eq!(aec.status, ActivityStatus::Pending);
        assert!(!aec.is_executing);

        aec.mark_running();
        assert_eq!(aec.status, ActivityStatus::Running);
        assert!(aec.is_executing);

        aec.mark_completed(Some("done".to_string()));
        assert_eq!(aec.status, ActivityStatus::Completed);
        assert!(!aec.is_executing);
        assert!(aec.completed_at.is_some());
        assert!(aec.is_terminal());
    }

    #[test]
    fn test_properties() {
        let mut aec = ActivityExecutionContext::new(Uuid::now_v7(), "seq".into(), None);
        aec.set_property("cursor", json!(2));
        assert_eq!(aec.property("cursor"), Some(&json!(2)));
    }
}
