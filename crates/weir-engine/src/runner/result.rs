//! Run results

use std::sync::Arc;

use serde_json::Value;

use crate::graph::Workflow;
use crate::state::WorkflowState;
use crate::workflow::WorkflowExecutionContext;

/// Everything a turn produces
#[derive(Debug)]
pub struct RunResult {
    /// The execution context after the turn
    pub workflow_execution_context: WorkflowExecutionContext,

    /// The committed snapshot
    pub workflow_state: WorkflowState,

    /// The definition the run executed
    pub workflow: Arc<Workflow>,

    /// Value of the declared result variable, if any
    pub result: Option<Value>,
}
