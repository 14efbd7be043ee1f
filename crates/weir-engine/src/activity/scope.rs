//! Activity scope: the handle activity callbacks operate through

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::activity::ActivityExecutionContext;
use crate::engine::ExecutionServices;
use crate::error::ActivityFault;
use crate::graph::{ActivityNode, NodeId};
use crate::memory::BlockId;
use crate::scheduler::WorkItem;
use crate::workflow::{
    Bookmark, BookmarkOptions, ExecutionLogEvent, WorkflowExecutionContext,
};

/// Options for scheduling a child activity
#[derive(Debug, Clone, Default)]
pub struct ScheduleChildOptions {
    /// Insert at the front of the queue so the child runs before sibling
    /// work scheduled earlier by ancestors
    pub prepend: bool,

    /// Tag copied onto the child execution context
    pub tag: Option<String>,

    /// Input overrides for the child
    pub input: Option<Map<String, Value>>,

    /// Dynamic variables bound into the child's register
    pub variables: Option<Map<String, Value>>,
}

impl ScheduleChildOptions {
    /// Schedule at the front of the queue
    pub fn prepend() -> Self {
        Self {
            prepend: true,
            ..Self::default()
        }
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set input overrides
    pub fn with_input(mut self, input: Map<String, Value>) -> Self {
        self.input = Some(input);
        self
    }
}

/// Borrow-scoped handle over one activity execution
///
/// The scope bundles the workflow execution context, the engine services,
/// and the id of the activity being executed. Every operation an activity
/// implementation performs (completing, faulting, creating bookmarks,
/// reading and writing variables, scheduling children) goes through here,
/// which keeps the execution-context table free of back-pointers.
pub struct ActivityScope<'a> {
    wec: &'a mut WorkflowExecutionContext,
    services: &'a ExecutionServices,
    aec_id: Uuid,
    node: Arc<ActivityNode>,
}

impl<'a> ActivityScope<'a> {
    /// Build a scope for an existing execution context
    ///
    /// Returns `None` when the context or its node is missing; both are
    /// validated by the drain before any callback runs.
    pub fn new(
        wec: &'a mut WorkflowExecutionContext,
        services: &'a ExecutionServices,
        aec_id: Uuid,
    ) -> Option<Self> {
        let node_id = wec.activity_context(aec_id)?.node_id.clone();
        let node = wec.graph().node(&node_id)?.clone();
        Some(Self {
            wec,
            services,
            aec_id,
            node,
        })
    }

    /// The node being executed
    pub fn node(&self) -> &Arc<ActivityNode> {
        &self.node
    }

    /// Id of the activity execution context
    pub fn activity_instance_id(&self) -> Uuid {
        self.aec_id
    }

    /// Id of the workflow instance
    pub fn instance_id(&self) -> Uuid {
        self.wec.instance_id
    }

    /// The execution context
    pub fn context(&self) -> &ActivityExecutionContext {
        self.wec
            .activity_context(self.aec_id)
            .expect("scope context validated at construction")
    }

    fn context_mut(&mut self) -> &mut ActivityExecutionContext {
        self.wec
            .activity_context_mut(self.aec_id)
            .expect("scope context validated at construction")
    }

    /// The workflow execution context
    pub fn workflow(&self) -> &WorkflowExecutionContext {
        self.wec
    }

    /// Cancellation token for cooperative checks inside long callbacks
    pub fn cancellation(&self) -> CancellationToken {
        self.wec.cancellation.clone()
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.wec.cancellation.is_cancelled()
    }

    // =========================================================================
    // Inputs, outputs, properties
    // =========================================================================

    /// Read an effective input value
    pub fn input(&self, name: &str) -> Option<Value> {
        self.context().input_value(name).cloned()
    }

    /// Read an effective input as a string
    pub fn input_string(&self, name: &str) -> Option<String> {
        self.input(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Write an activity output
    pub fn set_output(&mut self, name: impl Into<String>, value: Value) {
        self.context_mut().output.insert(name.into(), value);
    }

    /// Write a workflow output
    pub fn set_workflow_output(&mut self, name: impl Into<String>, value: Value) {
        self.wec.output.insert(name.into(), value);
    }

    /// Read a runtime property
    pub fn property(&self, name: &str) -> Option<Value> {
        self.context().property(name).cloned()
    }

    /// Write a runtime property
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.context_mut().set_property(name, value);
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Read a variable with lexical scoping, delegating storage-driven
    /// blocks to their registered driver
    pub async fn get_variable(&self, name: &str) -> Result<Option<Value>, ActivityFault> {
        let id = BlockId::new(name);
        let Some(block) = self.wec.resolve_block(Some(self.aec_id), &id) else {
            return Ok(None);
        };
        match &block.driver {
            Some(driver_name) => {
                let driver = self
                    .services
                    .storage_drivers
                    .get(driver_name)
                    .map_err(|e| ActivityFault::new(e.to_string()).with_kind("storage"))?;
                driver
                    .read(self.wec.instance_id, &id)
                    .await
                    .map_err(|e| ActivityFault::new(e.to_string()).with_kind("storage"))
            }
            None => Ok(Some(block.value.clone())),
        }
    }

    /// Write a variable with dynamic-variable semantics, delegating
    /// storage-driven blocks to their registered driver
    pub async fn set_variable(&mut self, name: &str, value: Value) -> Result<(), ActivityFault> {
        let id = BlockId::new(name);
        let driver_name = self
            .wec
            .resolve_block(Some(self.aec_id), &id)
            .and_then(|block| block.driver.clone());

        match driver_name {
            Some(driver_name) => {
                let driver = self
                    .services
                    .storage_drivers
                    .get(&driver_name)
                    .map_err(|e| ActivityFault::new(e.to_string()).with_kind("storage"))?;
                driver
                    .write(self.wec.instance_id, &id, value)
                    .await
                    .map_err(|e| ActivityFault::new(e.to_string()).with_kind("storage"))
            }
            None => {
                self.wec.set_variable(Some(self.aec_id), &id, value);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Completion and bookmarks
    // =========================================================================

    /// Complete the activity
    pub fn complete(&mut self) {
        self.complete_with_outcome(None);
    }

    /// Complete the activity with an outcome for parent continuations
    pub fn complete_with_outcome(&mut self, outcome: impl Into<Option<String>>) {
        let outcome = outcome.into();
        let node_id = self.context().node_id.clone();
        self.context_mut().mark_completed(outcome.clone());
        self.wec.record(
            ExecutionLogEvent::ActivityCompleted { node_id, outcome },
            Some(self.aec_id),
        );
    }

    /// Cancel the activity
    pub fn cancel(&mut self) {
        let node_id = self.context().node_id.clone();
        self.context_mut().mark_cancelled();
        self.wec.remove_bookmarks_of(self.aec_id);
        let aec_id = self.aec_id;
        self.wec
            .scheduler
            .unschedule(|item| item.owner_aec_id == Some(aec_id));
        self.wec.record(
            ExecutionLogEvent::ActivityCancelled { node_id },
            Some(self.aec_id),
        );
    }

    /// Create a bookmark owned by this execution context
    pub fn create_bookmark(&mut self, name: impl Into<String>, options: BookmarkOptions) -> Uuid {
        let id = self.services.identity.next_id();
        let bookmark = Bookmark::new(
            id,
            self.context().node_id.clone(),
            self.aec_id,
            name,
            options,
        );
        self.wec.add_bookmark(bookmark);
        id
    }

    /// Bookmarks owned by this execution context
    pub fn bookmarks(&self) -> Vec<&Bookmark> {
        self.wec.bookmarks_of(self.aec_id).collect()
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Node ids of this activity's children, in port order
    pub fn child_node_ids(&self) -> Vec<NodeId> {
        let base = &self.context().node_id;
        self.node
            .children()
            .map(|child| base.child(&child.id))
            .collect()
    }

    /// Node id of the child attached to the named port
    pub fn child_port(&self, port: &str) -> Option<NodeId> {
        let base = &self.context().node_id;
        self.node
            .ports
            .iter()
            .find(|p| p.name == port)
            .map(|p| base.child(&p.node.id))
    }

    /// Schedule a child activity
    pub fn schedule_child(
        &mut self,
        node_id: &NodeId,
        options: ScheduleChildOptions,
    ) -> Result<(), ActivityFault> {
        let item = self.child_work_item(node_id, &options)?;
        if options.prepend {
            self.wec.scheduler.schedule_first(item);
        } else {
            self.wec.scheduler.schedule(item);
        }
        Ok(())
    }

    /// Schedule several children, preserving their relative order
    pub fn schedule_children(
        &mut self,
        node_ids: &[NodeId],
        options: ScheduleChildOptions,
    ) -> Result<(), ActivityFault> {
        let items = node_ids
            .iter()
            .map(|node_id| self.child_work_item(node_id, &options))
            .collect::<Result<Vec<_>, _>>()?;
        if options.prepend {
            self.wec.scheduler.schedule_many_first(items);
        } else {
            for item in items {
                self.wec.scheduler.schedule(item);
            }
        }
        Ok(())
    }

    fn child_work_item(
        &mut self,
        node_id: &NodeId,
        options: &ScheduleChildOptions,
    ) -> Result<WorkItem, ActivityFault> {
        if !self.wec.graph().contains(node_id) {
            return Err(
                ActivityFault::new(format!("schedule rejected: {node_id} is not in the graph"))
                    .with_kind("schedule_rejected"),
            );
        }

        let mut item = WorkItem::start(node_id.clone()).with_owner(self.aec_id);
        if let Some(tag) = &options.tag {
            item = item.with_tag(tag.clone());
        }
        if let Some(input) = &options.input {
            item = item.with_input(input.clone());
        }
        if let Some(variables) = &options.variables {
            item = item.with_variables(variables.clone());
        }

        self.wec.record(
            ExecutionLogEvent::ActivityScheduled {
                node_id: node_id.clone(),
            },
            Some(self.aec_id),
        );
        Ok(item)
    }

    // =========================================================================
    // Workflow-level control
    // =========================================================================

    /// Complete the whole workflow early
    ///
    /// Binds `result` to the declared result variable (when any), cancels
    /// all other live execution contexts, and drops pending work so the
    /// turn ends with the workflow finished.
    pub fn finish_workflow(&mut self, result: Option<Value>) {
        if let Some(value) = result {
            if let Some(name) = self.wec.graph().workflow().result_variable.clone() {
                self.wec
                    .set_variable(None, &BlockId::new(name), value.clone());
            }
            self.wec.output.insert("result".to_string(), value);
        }

        self.complete();

        let live: Vec<Uuid> = self
            .wec
            .activity_contexts()
            .filter(|aec| !aec.is_terminal())
            .map(|aec| aec.id)
            .collect();
        for id in live {
            let node_id = match self.wec.activity_context_mut(id) {
                Some(aec) => {
                    let node_id = aec.node_id.clone();
                    aec.mark_cancelled();
                    node_id
                }
                None => continue,
            };
            self.wec
                .record(ExecutionLogEvent::ActivityCancelled { node_id }, Some(id));
        }
        self.wec.bookmarks.clear();
        self.wec.scheduler.clear();
    }
}
