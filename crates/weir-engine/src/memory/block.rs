//! Memory blocks

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VariableScope;

/// Variable identity inside a register
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Create a block id from a variable name
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether a block came from a declaration or was bound at runtime
///
/// The distinction matters on the write path: writes resolve to the nearest
/// declared block, while dynamic blocks are created in the writer's own
/// register when no declaration exists anywhere on the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Declared on the workflow definition
    Declared,

    /// Created at runtime (resumption input, scope writes)
    Dynamic,
}

/// A single variable binding: current value plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlock {
    /// Current value; `Value::Null` for storage-driven blocks
    pub value: Value,

    /// Declaration kind
    pub kind: BlockKind,

    /// Storage scope, controls persistence of the block
    pub scope: VariableScope,

    /// Name of the storage driver that owns the value, if any
    pub driver: Option<String>,
}

impl MemoryBlock {
    /// A declared block with the given default value
    pub fn declared(value: Value, scope: VariableScope) -> Self {
        Self {
            value,
            kind: BlockKind::Declared,
            scope,
            driver: None,
        }
    }

    /// A dynamic block bound at runtime
    pub fn dynamic(value: Value) -> Self {
        Self {
            value,
            kind: BlockKind::Dynamic,
            scope: VariableScope::Local,
            driver: None,
        }
    }

    /// Mark the block as owned by a named storage driver
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }
}
