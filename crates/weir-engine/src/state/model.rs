//! Persisted state model

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::EngineError;
use crate::graph::NodeId;
use crate::memory::{BlockId, MemoryBlock};
use crate::scheduler::WorkItem;
use crate::workflow::{
    ActivityStatus, Bookmark, ExecutionLogEntry, Incident, WorkflowStatus, WorkflowSubStatus,
};

/// Current snapshot schema version
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Flat record of one activity execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityContextRecord {
    pub id: Uuid,
    pub node_id: NodeId,
    pub parent_id: Option<Uuid>,
    pub status: ActivityStatus,
    pub is_executing: bool,
    pub tag: Option<String>,
    pub outcome: Option<String>,
    pub input: Map<String, Value>,
    pub output: Map<String, Value>,
    pub properties: Map<String, Value>,
    pub variables: HashMap<BlockId, MemoryBlock>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Serializable snapshot of a workflow execution context
///
/// Contains everything needed to resume the run minus transient references
/// (graph, cancellation token). Activity records are stored in creation
/// order; the applicator rebuilds the forest by wiring `parent_id` links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Snapshot schema version
    pub state_format_version: u32,

    pub instance_id: Uuid,
    pub definition_id: String,
    pub definition_version: i32,
    pub correlation_id: Option<String>,
    pub parent_instance_id: Option<Uuid>,
    pub tenant_id: Option<String>,
    pub status: WorkflowStatus,
    pub sub_status: WorkflowSubStatus,
    pub input: Map<String, Value>,
    pub output: Map<String, Value>,
    pub properties: Map<String, Value>,

    /// Root register bindings, keyed by block id
    pub variables: HashMap<BlockId, MemoryBlock>,

    /// Activity records in creation order
    pub activity_execution_contexts: Vec<ActivityContextRecord>,

    pub bookmarks: Vec<Bookmark>,
    pub incidents: Vec<Incident>,

    /// Scheduler queue at snapshot time, in execution order
    pub scheduler: Vec<WorkItem>,

    /// Append-only transition journal
    pub execution_log: Vec<ExecutionLogEntry>,
}

impl WorkflowState {
    /// Decode a snapshot from its JSON rendering, running declared
    /// migrations for older formats
    ///
    /// Fails with [`EngineError::StateVersionMismatch`] when the snapshot
    /// is newer than this engine's format.
    pub fn from_value(mut value: Value) -> Result<Self, EngineError> {
        let found = value
            .get("state_format_version")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;

        if found > STATE_FORMAT_VERSION {
            return Err(EngineError::StateVersionMismatch {
                found,
                supported: STATE_FORMAT_VERSION,
            });
        }

        for version in found..STATE_FORMAT_VERSION {
            migrate_from(&mut value, version);
        }
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "state_format_version".to_string(),
                Value::from(STATE_FORMAT_VERSION),
            );
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Encode the snapshot to its JSON rendering
    pub fn to_value(&self) -> Result<Value, EngineError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Rewrite a snapshot from `version` to `version + 1`
fn migrate_from(value: &mut Value, version: u32) {
    match version {
        // 0 predates the versioned schema; field layout is unchanged
        0 => {}
        _ => {
            let _ = value;
        }
    }
}
