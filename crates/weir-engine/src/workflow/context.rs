//! Workflow execution context

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::activity::ActivityExecutionContext;
use crate::graph::WorkflowGraph;
use crate::memory::{BlockId, MemoryBlock, MemoryRegister};
use crate::scheduler::Scheduler;
use crate::workflow::{
    Bookmark, ExecutionLogEntry, ExecutionLogEvent, Incident, WorkflowStatus, WorkflowSubStatus,
};

/// Runtime state for one in-flight workflow instance
///
/// The context owns everything mutable about a run: the flat table of
/// activity execution contexts, the scheduler, bookmarks, incidents, the
/// root memory register, and the journal. The activity table forms a
/// forest; each non-root context names its parent by id and navigation is
/// by lookup (no back-pointers, no ownership cycles).
pub struct WorkflowExecutionContext {
    /// Unique instance id
    pub instance_id: Uuid,

    /// Definition the run was created from
    pub definition_id: String,

    /// Definition version
    pub definition_version: i32,

    /// Correlation id for external lookup
    pub correlation_id: Option<String>,

    /// Parent workflow instance, for child runs
    pub parent_instance_id: Option<Uuid>,

    /// Owning tenant
    pub tenant_id: Option<String>,

    /// Coarse status
    pub status: WorkflowStatus,

    /// Fine-grained status
    pub sub_status: WorkflowSubStatus,

    /// Read-only workflow input
    pub input: Map<String, Value>,

    /// Workflow output
    pub output: Map<String, Value>,

    /// Free-form run metadata
    pub properties: Map<String, Value>,

    /// Pending work
    pub scheduler: Scheduler,

    /// Resumption handles
    pub bookmarks: Vec<Bookmark>,

    /// Recorded faults
    pub incidents: Vec<Incident>,

    /// Root memory register (workflow-scope variables, dynamic seeds)
    pub root_register: MemoryRegister,

    /// Append-only journal of state transitions
    pub journal: Vec<ExecutionLogEntry>,

    /// Cancellation token threaded into every activity callback
    pub cancellation: CancellationToken,

    graph: Arc<WorkflowGraph>,
    activity_contexts: HashMap<Uuid, ActivityExecutionContext>,
    creation_order: Vec<Uuid>,
}

impl WorkflowExecutionContext {
    /// Create a fresh context in `Pending` state
    pub fn new(graph: Arc<WorkflowGraph>, instance_id: Uuid) -> Self {
        let workflow = graph.workflow().clone();
        let mut root_register = MemoryRegister::new();
        for variable in &workflow.variables {
            root_register.declare(variable);
        }

        Self {
            instance_id,
            definition_id: workflow.definition_id.clone(),
            definition_version: workflow.version,
            correlation_id: None,
            parent_instance_id: None,
            tenant_id: None,
            status: WorkflowStatus::Running,
            sub_status: WorkflowSubStatus::Pending,
            input: Map::new(),
            output: Map::new(),
            properties: Map::new(),
            scheduler: Scheduler::new(),
            bookmarks: Vec::new(),
            incidents: Vec::new(),
            root_register,
            journal: Vec::new(),
            cancellation: CancellationToken::new(),
            graph,
            activity_contexts: HashMap::new(),
            creation_order: Vec::new(),
        }
    }

    /// The materialized graph for this run
    pub fn graph(&self) -> &Arc<WorkflowGraph> {
        &self.graph
    }

    /// Whether the run reached a terminal sub-status
    pub fn is_terminal(&self) -> bool {
        self.sub_status.is_terminal()
    }

    /// Transition to a new sub-status, keeping the coarse status consistent
    pub fn transition(&mut self, sub_status: WorkflowSubStatus) {
        self.sub_status = sub_status;
        self.status = if sub_status.is_terminal() {
            WorkflowStatus::Finished
        } else {
            WorkflowStatus::Running
        };
        if sub_status.is_terminal() {
            self.record(ExecutionLogEvent::WorkflowEnded { sub_status }, None);
        }
    }

    // =========================================================================
    // Activity execution contexts
    // =========================================================================

    /// Add a context to the table
    pub fn add_activity_context(&mut self, aec: ActivityExecutionContext) {
        self.creation_order.push(aec.id);
        self.activity_contexts.insert(aec.id, aec);
    }

    /// Look up a context by id
    pub fn activity_context(&self, id: Uuid) -> Option<&ActivityExecutionContext> {
        self.activity_contexts.get(&id)
    }

    /// Look up a context mutably
    pub fn activity_context_mut(&mut self, id: Uuid) -> Option<&mut ActivityExecutionContext> {
        self.activity_contexts.get_mut(&id)
    }

    /// Iterate contexts in creation order
    pub fn activity_contexts(&self) -> impl Iterator<Item = &ActivityExecutionContext> {
        self.creation_order
            .iter()
            .filter_map(|id| self.activity_contexts.get(id))
    }

    /// Ids of the direct children of a context, in creation order
    pub fn children_of(&self, parent_id: Uuid) -> Vec<Uuid> {
        self.activity_contexts()
            .filter(|aec| aec.parent_id == Some(parent_id))
            .map(|aec| aec.id)
            .collect()
    }

    /// Whether any context still owns uncompleted work
    pub fn has_executing_activities(&self) -> bool {
        self.activity_contexts.values().any(|aec| aec.is_executing)
    }

    /// Contexts with uncompleted work, ascending by start time
    pub fn executing_activities(&self) -> Vec<Uuid> {
        let mut executing: Vec<_> = self
            .activity_contexts
            .values()
            .filter(|aec| aec.is_executing)
            .map(|aec| (aec.started_at, aec.id))
            .collect();
        executing.sort();
        executing.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether a completed context can be dropped from the table
    ///
    /// A context is removable once it is terminal, owns no bookmarks, and
    /// has no live children. The engine never compacts on its own; hosts
    /// may call [`compact`](Self::compact) between turns.
    pub fn is_removable(&self, id: Uuid) -> bool {
        let Some(aec) = self.activity_contexts.get(&id) else {
            return false;
        };
        aec.is_terminal()
            && !self.bookmarks.iter().any(|b| b.activity_instance_id == id)
            && self
                .activity_contexts
                .values()
                .all(|child| child.parent_id != Some(id))
    }

    /// Drop all removable contexts
    pub fn compact(&mut self) {
        let removable: Vec<Uuid> = self
            .creation_order
            .iter()
            .copied()
            .filter(|id| self.is_removable(*id))
            .collect();
        for id in removable {
            self.activity_contexts.remove(&id);
            self.creation_order.retain(|existing| *existing != id);
        }
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Resolve a block by walking from a context toward the root register
    pub fn resolve_block(&self, start: Option<Uuid>, id: &BlockId) -> Option<&MemoryBlock> {
        let mut current = start;
        while let Some(aec_id) = current {
            let aec = self.activity_contexts.get(&aec_id)?;
            if let Some(block) = aec.register.block(id) {
                return Some(block);
            }
            current = aec.parent_id;
        }
        self.root_register.block(id)
    }

    /// Read a variable with lexical scoping
    pub fn get_variable(&self, start: Option<Uuid>, id: &BlockId) -> Option<Value> {
        self.resolve_block(start, id).map(|b| b.value.clone())
    }

    /// Write a variable with dynamic-variable semantics
    ///
    /// Binds in the nearest register on the chain that already holds the
    /// block; when none does, binds dynamically in the starting register
    /// (the root register when `start` is `None`).
    pub fn set_variable(&mut self, start: Option<Uuid>, id: &BlockId, value: Value) {
        let mut current = start;
        while let Some(aec_id) = current {
            let Some(aec) = self.activity_contexts.get_mut(&aec_id) else {
                break;
            };
            if aec.register.contains(id) {
                aec.register.set(id, value);
                return;
            }
            current = aec.parent_id;
        }
        if self.root_register.contains(id) {
            self.root_register.set(id, value);
            return;
        }

        match start {
            Some(aec_id) => {
                if let Some(aec) = self.activity_contexts.get_mut(&aec_id) {
                    aec.register.bind_dynamic(id.clone(), value);
                }
            }
            None => self.root_register.bind_dynamic(id.clone(), value),
        }
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// Add a bookmark and journal its creation
    pub fn add_bookmark(&mut self, bookmark: Bookmark) {
        self.record(
            ExecutionLogEvent::BookmarkCreated {
                bookmark_id: bookmark.id,
                name: bookmark.name.clone(),
            },
            Some(bookmark.activity_instance_id),
        );
        self.bookmarks.push(bookmark);
    }

    /// Look up a bookmark by id
    pub fn find_bookmark(&self, id: Uuid) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    /// Look up a bookmark by its `(name, payload)` hash
    pub fn find_bookmark_by_hash(&self, hash: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.hash == hash)
    }

    /// Bookmarks owned by a context
    pub fn bookmarks_of(&self, aec_id: Uuid) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks
            .iter()
            .filter(move |b| b.activity_instance_id == aec_id)
    }

    /// Remove a bookmark, journaling the burn
    pub fn burn_bookmark(&mut self, id: Uuid) -> Option<Bookmark> {
        let index = self.bookmarks.iter().position(|b| b.id == id)?;
        let bookmark = self.bookmarks.remove(index);
        self.record(
            ExecutionLogEvent::BookmarkBurned {
                bookmark_id: bookmark.id,
                name: bookmark.name.clone(),
            },
            Some(bookmark.activity_instance_id),
        );
        Some(bookmark)
    }

    /// Remove all bookmarks owned by a context
    pub fn remove_bookmarks_of(&mut self, aec_id: Uuid) {
        self.bookmarks
            .retain(|b| b.activity_instance_id != aec_id);
    }

    // =========================================================================
    // Incidents and journal
    // =========================================================================

    /// Record an incident and journal it
    pub fn record_incident(&mut self, incident: Incident) {
        self.record(
            ExecutionLogEvent::IncidentRecorded {
                incident_id: incident.id,
                message: incident.message.clone(),
            },
            incident.activity_instance_id,
        );
        self.incidents.push(incident);
    }

    /// Append a journal entry
    pub fn record(&mut self, event: ExecutionLogEvent, activity_instance_id: Option<Uuid>) {
        self.journal
            .push(ExecutionLogEntry::new(event, activity_instance_id));
    }
}

impl std::fmt::Debug for WorkflowExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowExecutionContext")
            .field("instance_id", &self.instance_id)
            .field("definition_id", &self.definition_id)
            .field("status", &self.status)
            .field("sub_status", &self.sub_status)
            .field("activity_contexts", &self.creation_order.len())
            .field("bookmarks", &self.bookmarks.len())
            .field("incidents", &self.incidents.len())
            .field("scheduled", &self.scheduler.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityExecutionContext;
    use crate::graph::{ActivityNode, Workflow};
    use crate::memory::Variable;
    use serde_json::json;

    fn context() -> WorkflowExecutionContext {
        let workflow = Workflow::new("test", ActivityNode::new("root", "sequence"))
            .with_variable(Variable::workflow("counter").with_default(json!(0)));
        let graph = Arc::new(WorkflowGraph::new(Arc::new(workflow)));
        WorkflowExecutionContext::new(graph, Uuid::now_v7())
    }

    #[test]
    fn test_workflow_variables_bound_at_creation() {
        let wec = context();
        assert_eq!(wec.get_variable(None, &"counter".into()), Some(json!(0)));
    }

    #[test]
    fn test_variable_resolution_walks_parent_chain() {
        let mut wec = context();
        let parent_id = Uuid::now_v7();
        let child_id = Uuid::now_v7();

        let mut parent = ActivityExecutionContext::new(parent_id, "root".into(), None);
        parent
            .register
            .declare(&Variable::new("local").with_default(json!("from-parent")));
        wec.add_activity_context(parent);
        wec.add_activity_context(ActivityExecutionContext::new(
            child_id,
            "root:a".into(),
            Some(parent_id),
        ));

        assert_eq!(
            wec.get_variable(Some(child_id), &"local".into()),
            Some(json!("from-parent"))
        );
        assert_eq!(
            wec.get_variable(Some(child_id), &"counter".into()),
            Some(json!(0))
        );
    }

    #[test]
    fn test_set_binds_in_nearest_declaring_register() {
        let mut wec = context();
        let aec_id = Uuid::now_v7();
        wec.add_activity_context(ActivityExecutionContext::new(aec_id, "root".into(), None));

        wec.set_variable(Some(aec_id), &"counter".into(), json!(5));
        assert_eq!(wec.get_variable(None, &"counter".into()), Some(json!(5)));
        // the write landed on the root register, not the activity's own
        assert!(!wec
            .activity_context(aec_id)
            .unwrap()
            .register
            .contains(&"counter".into()));
    }

    #[test]
    fn test_set_unknown_binds_dynamically_in_caller() {
        let mut wec = context();
        let aec_id = Uuid::now_v7();
        wec.add_activity_context(ActivityExecutionContext::new(aec_id, "root".into(), None));

        wec.set_variable(Some(aec_id), &"scratch".into(), json!(true));
        assert!(wec
            .activity_context(aec_id)
            .unwrap()
            .register
            .contains(&"scratch".into()));
        assert_eq!(wec.get_variable(None, &"scratch".into()), None);
    }

    #[test]
    fn test_executing_activities_sorted_by_start() {
        let mut wec = context();
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();

        let mut a = ActivityExecutionContext::new(first, "root".into(), None);
        a.mark_running();
        wec.add_activity_context(a);

        let mut b = ActivityExecutionContext::new(second, "root:a".into(), Some(first));
        b.started_at = b.started_at + chrono::Duration::milliseconds(10);
        b.mark_running();
        wec.add_activity_context(b);

        assert_eq!(wec.executing_activities(), vec![first, second]);
    }

    #[test]
    fn test_compact_keeps_contexts_with_bookmarks() {
        let mut wec = context();
        let aec_id = Uuid::now_v7();
        let mut aec = ActivityExecutionContext::new(aec_id, "root".into(), None);
        aec.mark_running();
        aec.mark_completed(None);
        wec.add_activity_context(aec);

        wec.add_bookmark(crate::workflow::Bookmark::new(
            Uuid::now_v7(),
            "root".into(),
            aec_id,
            "evt",
            Default::default(),
        ));

        assert!(!wec.is_removable(aec_id));
        wec.compact();
        assert!(wec.activity_context(aec_id).is_some());
    }

    #[test]
    fn test_transition_journal_and_status() {
        let mut wec = context();
        wec.transition(WorkflowSubStatus::Executing);
        assert_eq!(wec.status, WorkflowStatus::Running);

        wec.transition(WorkflowSubStatus::Finished);
        assert_eq!(wec.status, WorkflowStatus::Finished);
        assert!(wec
            .journal
            .iter()
            .any(|e| matches!(e.event, ExecutionLogEvent::WorkflowEnded { .. })));
    }
}
