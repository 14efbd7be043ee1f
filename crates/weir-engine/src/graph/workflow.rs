//! Workflow definition root

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ActivityNode;
use crate::memory::Variable;

/// How activity faults travel through the execution context tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultStrategy {
    /// Fault every ancestor up to the root and end the workflow as faulted
    #[default]
    PropagateToRoot,

    /// Record the incident, fault the activity, and keep the workflow running
    Contain,
}

/// A workflow definition: the root activity plus run-level declarations
///
/// Definitions are immutable and shared between concurrent runs via `Arc`.
/// The engine materializes a [`WorkflowGraph`](super::WorkflowGraph) from a
/// definition once per run request.
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Definition identity, recorded into persisted state
    pub definition_id: String,

    /// Definition version, recorded into persisted state
    pub version: i32,

    /// Root activity
    pub root: Arc<ActivityNode>,

    /// Workflow-scope variables, bound into the root register at run start
    pub variables: Vec<Variable>,

    /// Variable the run result is read from when the run finishes
    pub result_variable: Option<String>,

    /// Fault handling strategy for activity faults
    pub fault_strategy: FaultStrategy,

    /// Free-form definition metadata
    pub properties: Map<String, Value>,
}

impl Workflow {
    /// Create a definition with the given id and root activity
    pub fn new(definition_id: impl Into<String>, root: ActivityNode) -> Self {
        Self {
            definition_id: definition_id.into(),
            version: 1,
            root: Arc::new(root),
            variables: Vec::new(),
            result_variable: None,
            fault_strategy: FaultStrategy::default(),
            properties: Map::new(),
        }
    }

    /// Set the definition version
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Declare a workflow-scope variable
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Bind the run result to the named variable
    pub fn with_result_variable(mut self, name: impl Into<String>) -> Self {
        self.result_variable = Some(name.into());
        self
    }

    /// Set the fault strategy
    pub fn with_fault_strategy(mut self, strategy: FaultStrategy) -> Self {
        self.fault_strategy = strategy;
        self
    }
}
