//! Variable declarations

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BlockId;

/// Storage scope of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    /// Bound into the workflow root register, visible everywhere
    Workflow,

    /// Bound into the declaring activity's register
    #[default]
    Local,

    /// Like `Local`, but never persisted into workflow state
    Transient,
}

/// A declared variable: a named slot with a storage scope and default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Block identity; defaults to the variable name
    pub id: BlockId,

    /// Variable name
    pub name: String,

    /// Storage scope
    pub scope: VariableScope,

    /// Default value bound at declaration time
    pub default_value: Value,

    /// Storage driver that owns the value, if any
    pub storage_driver: Option<String>,
}

impl Variable {
    /// Declare a local variable with a null default
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: BlockId::new(name.clone()),
            name,
            scope: VariableScope::default(),
            default_value: Value::Null,
            storage_driver: None,
        }
    }

    /// Declare a workflow-scope variable with a null default
    pub fn workflow(name: impl Into<String>) -> Self {
        Self::new(name).with_scope(VariableScope::Workflow)
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: VariableScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = value;
        self
    }

    /// Delegate the value to a named storage driver
    pub fn with_storage_driver(mut self, driver: impl Into<String>) -> Self {
        self.storage_driver = Some(driver.into());
        self
    }
}
