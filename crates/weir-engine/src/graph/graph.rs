//! Materialized workflow graph with lookup indices

use std::collections::HashMap;
use std::sync::Arc;

use super::{ActivityNode, NodeId, Workflow};

/// The materialized form of a workflow: the root activity plus indices for
/// lookup by node id, activity id, type name, and tag
///
/// Graphs are built once per run request and shared read-only for the life
/// of the run. Execution contexts reference nodes by [`NodeId`] only; no
/// runtime structure points back into the graph.
#[derive(Debug)]
pub struct WorkflowGraph {
    workflow: Arc<Workflow>,
    root_id: NodeId,
    nodes: HashMap<NodeId, Arc<ActivityNode>>,
    by_activity_id: HashMap<String, NodeId>,
    by_name: HashMap<String, NodeId>,
    by_type: HashMap<String, Vec<NodeId>>,
    by_tag: HashMap<String, Vec<NodeId>>,
}

impl WorkflowGraph {
    /// Materialize the graph for a definition
    pub fn new(workflow: Arc<Workflow>) -> Self {
        let root_id = NodeId::root(&workflow.root.id);
        let mut graph = Self {
            root_id: root_id.clone(),
            nodes: HashMap::new(),
            by_activity_id: HashMap::new(),
            by_name: HashMap::new(),
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
            workflow,
        };

        let root = graph.workflow.root.clone();
        graph.index(root_id, root);
        graph
    }

    fn index(&mut self, node_id: NodeId, node: Arc<ActivityNode>) {
        self.by_activity_id
            .entry(node.id.clone())
            .or_insert_with(|| node_id.clone());
        if let Some(name) = &node.name {
            self.by_name
                .entry(name.clone())
                .or_insert_with(|| node_id.clone());
        }
        self.by_type
            .entry(node.type_name.clone())
            .or_default()
            .push(node_id.clone());
        if let Some(tag) = &node.tag {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .push(node_id.clone());
        }

        for child in node.children() {
            let child_id = node_id.child(&child.id);
            self.index(child_id, child.clone());
        }

        self.nodes.insert(node_id, node);
    }

    /// The definition this graph was built from
    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }

    /// Node id of the root activity
    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    /// Look up a node by its node id
    pub fn node(&self, node_id: &NodeId) -> Option<&Arc<ActivityNode>> {
        self.nodes.get(node_id)
    }

    /// Whether the graph contains the node
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Resolve the first node with the given activity id
    pub fn find_by_activity_id(&self, activity_id: &str) -> Option<&NodeId> {
        self.by_activity_id.get(activity_id)
    }

    /// Resolve the first node with the given display name
    pub fn find_by_name(&self, name: &str) -> Option<&NodeId> {
        self.by_name.get(name)
    }

    /// All nodes of the given handler type
    pub fn find_by_type(&self, type_name: &str) -> &[NodeId] {
        self.by_type.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes carrying the given tag
    pub fn find_by_tag(&self, tag: &str) -> &[NodeId] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty (never true for a materialized graph)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
