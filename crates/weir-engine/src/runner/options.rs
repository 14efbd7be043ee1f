//! Run options

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::graph::NodeId;

/// Names an activity to resume, by instance or by graph position
///
/// When `activity_instance_id` is set it wins; otherwise the activity is
/// resolved on the graph by node id, activity id, or display name, in that
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityHandle {
    /// Existing execution context to resume
    pub activity_instance_id: Option<Uuid>,

    /// Node id on the graph
    pub node_id: Option<NodeId>,

    /// Activity id on the graph
    pub activity_id: Option<String>,

    /// Display name on the graph
    pub name: Option<String>,
}

impl ActivityHandle {
    /// Handle for an existing execution context
    pub fn instance(activity_instance_id: Uuid) -> Self {
        Self {
            activity_instance_id: Some(activity_instance_id),
            ..Self::default()
        }
    }

    /// Handle for a node id
    pub fn node(node_id: NodeId) -> Self {
        Self {
            node_id: Some(node_id),
            ..Self::default()
        }
    }

    /// Handle for an activity id
    pub fn activity(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: Some(activity_id.into()),
            ..Self::default()
        }
    }

    /// Short description for error messages
    pub(crate) fn describe(&self) -> String {
        self.node_id
            .as_ref()
            .map(|n| n.as_str().to_string())
            .or_else(|| self.activity_id.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "<empty handle>".to_string())
    }
}

/// Options recognized by [`WorkflowRunner`](crate::runner::WorkflowRunner)
#[derive(Debug, Clone, Default)]
pub struct RunWorkflowOptions {
    /// Use this instance id instead of generating one
    pub workflow_instance_id: Option<Uuid>,

    /// Set or override the correlation id
    pub correlation_id: Option<String>,

    /// Initial or additional workflow input, merged into the context
    pub input: Map<String, Value>,

    /// Dynamic variables seeded onto the root register
    pub variables: Map<String, Value>,

    /// Opaque metadata merged onto the context
    pub properties: Map<String, Value>,

    /// Resume from this bookmark (highest seeding priority)
    pub bookmark_id: Option<Uuid>,

    /// Resume this activity (second seeding priority)
    pub activity_handle: Option<ActivityHandle>,

    /// Activity that caused this invocation, recorded as metadata
    pub trigger_activity_id: Option<String>,

    /// Link a child run to its parent instance
    pub parent_workflow_instance_id: Option<Uuid>,

    /// Owning tenant
    pub tenant_id: Option<String>,

    /// Cancellation token threaded into the run
    pub cancellation: Option<CancellationToken>,
}

impl RunWorkflowOptions {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this instance id
    pub fn with_instance_id(mut self, id: Uuid) -> Self {
        self.workflow_instance_id = Some(id);
        self
    }

    /// Set the correlation id
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add a workflow input value
    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.input.insert(name.into(), value);
        self
    }

    /// Seed a dynamic variable
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Resume from a bookmark
    pub fn with_bookmark(mut self, bookmark_id: Uuid) -> Self {
        self.bookmark_id = Some(bookmark_id);
        self
    }

    /// Resume an activity
    pub fn with_activity_handle(mut self, handle: ActivityHandle) -> Self {
        self.activity_handle = Some(handle);
        self
    }

    /// Thread a cancellation token into the run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
