//! Activity nodes and node identity

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::memory::Variable;

/// Path-based node identity: the activity ids from the root to the node,
/// joined with `:`
///
/// Node ids are stable across runs of the same definition version and are
/// what execution contexts, bookmarks, and scheduler items reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Node id of a root activity
    pub fn root(activity_id: &str) -> Self {
        Self(activity_id.to_string())
    }

    /// Node id of a child under this node
    pub fn child(&self, activity_id: &str) -> Self {
        Self(format!("{}:{}", self.0, activity_id))
    }

    /// The raw path string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A named child slot on an activity node
#[derive(Debug, Clone)]
pub struct ActivityPort {
    /// Port name (for example `"branches"`, `"body"`)
    pub name: String,

    /// Child node attached to the port
    pub node: Arc<ActivityNode>,
}

/// An addressable, immutable node in the workflow tree
///
/// Nodes carry a stable `id` (unique among siblings), a `type_name` used to
/// resolve the handler in the activity registry, literal inputs, declared
/// variables, and zero or more named child ports. Nodes never change during
/// execution; all runtime state lives on the activity execution context.
#[derive(Debug, Clone)]
pub struct ActivityNode {
    /// Stable activity id, unique among siblings
    pub id: String,

    /// Registered handler type name
    pub type_name: String,

    /// Optional display name, addressable via `ActivityHandle::name`
    pub name: Option<String>,

    /// Optional tag propagated onto execution contexts
    pub tag: Option<String>,

    /// Literal input values, merged with work-item input at execution time
    pub inputs: Map<String, Value>,

    /// Variables declared in this node's scope
    pub variables: Vec<Variable>,

    /// Named child ports
    pub ports: Vec<ActivityPort>,
}

impl ActivityNode {
    /// Create a node with the given id and handler type
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            name: None,
            tag: None,
            inputs: Map::new(),
            variables: Vec::new(),
            ports: Vec::new(),
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a literal input
    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Declare a variable in this node's scope
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Attach a child node to the named port
    pub fn with_child(mut self, port: impl Into<String>, node: ActivityNode) -> Self {
        self.ports.push(ActivityPort {
            name: port.into(),
            node: Arc::new(node),
        });
        self
    }

    /// Child nodes in port order
    pub fn children(&self) -> impl Iterator<Item = &Arc<ActivityNode>> {
        self.ports.iter().map(|p| &p.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_id_paths() {
        let root = NodeId::root("seq");
        let child = root.child("a");
        assert_eq!(root.as_str(), "seq");
        assert_eq!(child.as_str(), "seq:a");
    }

    #[test]
    fn test_node_builder() {
        let node = ActivityNode::new("greet", "write_line")
            .with_name("Greet")
            .with_input("text", json!("hello"))
            .with_child("next", ActivityNode::new("done", "finish"));

        assert_eq!(node.id, "greet");
        assert_eq!(node.type_name, "write_line");
        assert_eq!(node.inputs.get("text"), Some(&json!("hello")));
        assert_eq!(node.children().count(), 1);
    }
}
