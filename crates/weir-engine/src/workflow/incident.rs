//! Incidents: recorded faults

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ActivityFault;
use crate::graph::NodeId;

/// A fault recorded on the workflow execution context
///
/// Incidents accumulate across turns; a workflow can be running with past
/// incidents when the fault strategy contained them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique incident id
    pub id: Uuid,

    /// Node the fault originated from, if any
    pub activity_node_id: Option<NodeId>,

    /// Execution context the fault originated from, if any
    pub activity_instance_id: Option<Uuid>,

    /// Fault message
    pub message: String,

    /// Fault code for programmatic handling
    pub kind: Option<String>,

    /// When the incident was recorded
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Record a fault raised by an activity
    pub fn from_fault(
        id: Uuid,
        node_id: NodeId,
        activity_instance_id: Uuid,
        fault: &ActivityFault,
    ) -> Self {
        Self {
            id,
            activity_node_id: Some(node_id),
            activity_instance_id: Some(activity_instance_id),
            message: fault.message.clone(),
            kind: fault.kind.clone(),
            created_at: Utc::now(),
        }
    }

    /// Record a fault not tied to any activity (for example a failing
    /// notification subscriber)
    pub fn detached(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            activity_node_id: None,
            activity_instance_id: None,
            message: message.into(),
            kind: None,
            created_at: Utc::now(),
        }
    }
}
