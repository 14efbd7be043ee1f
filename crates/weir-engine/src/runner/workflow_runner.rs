//! Workflow runner

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{ActivityHandle, RunResult, RunWorkflowOptions};
use crate::engine::{notify, ActivityDrain, ActivityRegistry, ExecutionServices};
use crate::error::EngineError;
use crate::graph::{NodeId, Workflow, WorkflowGraph};
use crate::ids::IdentityGenerator;
use crate::memory::{BlockId, StorageDriverRegistry};
use crate::notification::{NotificationSender, WorkflowNotification};
use crate::persistence::CommitHandler;
use crate::pipeline::{
    ActivityMiddleware, CheckpointMiddleware, LoggingScopeMiddleware, WorkflowMiddleware,
    WorkflowPipeline, WorkflowRun,
};
use crate::scheduler::WorkItem;
use crate::state::{extract, WorkflowState};
use crate::workflow::{
    ExecutionLogEvent, WorkflowExecutionContext, WorkflowStatus, WorkflowSubStatus,
};

/// Orchestrates workflow turns
///
/// The runner builds or rehydrates an execution context, decides what to
/// schedule first, runs the pipeline, emits lifecycle notifications at
/// their defined points, extracts state, and commits it. One runner serves
/// any number of instances; turns for the *same* instance must be
/// serialized by the hosting layer.
pub struct WorkflowRunner {
    services: ExecutionServices,
    pipeline: WorkflowPipeline,
}

impl WorkflowRunner {
    /// Runner with default wiring around the given registry
    pub fn new(registry: ActivityRegistry) -> Self {
        Self::builder(registry).build()
    }

    /// Start building a runner
    pub fn builder(registry: ActivityRegistry) -> WorkflowRunnerBuilder {
        WorkflowRunnerBuilder::new(registry)
    }

    /// The services this runner injects into every turn
    pub fn services(&self) -> &ExecutionServices {
        &self.services
    }

    /// Run a fresh workflow instance
    #[instrument(skip(self, workflow, options), fields(definition_id = %workflow.definition_id))]
    pub async fn run(
        &self,
        workflow: Arc<Workflow>,
        options: RunWorkflowOptions,
    ) -> Result<RunResult, EngineError> {
        let graph = Arc::new(WorkflowGraph::new(workflow.clone()));
        let instance_id = options
            .workflow_instance_id
            .unwrap_or_else(|| self.services.identity.next_id());
        info!(%instance_id, "starting new workflow");

        let mut wec = WorkflowExecutionContext::new(graph.clone(), instance_id);
        schedule_seed(&mut wec, WorkItem::start(graph.root_id().clone()));
        self.apply_options(&mut wec, &options);

        self.execute_turn(wec, workflow).await
    }

    /// Resume a workflow instance from persisted state
    #[instrument(skip(self, workflow, state, options), fields(definition_id = %workflow.definition_id, instance_id = %state.instance_id))]
    pub async fn resume(
        &self,
        workflow: Arc<Workflow>,
        state: WorkflowState,
        options: RunWorkflowOptions,
    ) -> Result<RunResult, EngineError> {
        if options.bookmark_id.is_some() && options.activity_handle.is_some() {
            return Err(EngineError::InvalidOptions(
                "bookmark_id and activity_handle are mutually exclusive".to_string(),
            ));
        }

        let graph = Arc::new(WorkflowGraph::new(workflow.clone()));
        let mut wec = crate::state::apply(state, graph.clone())?;

        self.seed(&mut wec, &graph, &options)?;
        self.apply_options(&mut wec, &options);

        self.execute_turn(wec, workflow).await
    }

    /// The seeding decision tree: pick exactly one way to get the turn going
    fn seed(
        &self,
        wec: &mut WorkflowExecutionContext,
        graph: &Arc<WorkflowGraph>,
        options: &RunWorkflowOptions,
    ) -> Result<(), EngineError> {
        if let Some(bookmark_id) = options.bookmark_id {
            let bookmark = wec
                .find_bookmark(bookmark_id)
                .ok_or(EngineError::BookmarkNotFound(bookmark_id))?
                .clone();
            debug!(%bookmark_id, name = %bookmark.name, "seeding from bookmark");
            let mut item = WorkItem::resume(
                bookmark.activity_node_id.clone(),
                bookmark.activity_instance_id,
            )
            .with_bookmark(bookmark_id);
            if !options.input.is_empty() {
                item = item.with_input(options.input.clone());
            }
            schedule_seed(wec, item);
            return Ok(());
        }

        if let Some(handle) = &options.activity_handle {
            return self.seed_from_handle(wec, graph, handle, options);
        }

        if wec.scheduler.has_any() {
            debug!(pending = wec.scheduler.len(), "seeding skipped, queue has work");
            return Ok(());
        }

        // Contexts that own a bookmark are awaiting external resumption,
        // not interrupted; only bookmark-less executing contexts reschedule.
        let interrupted: Vec<Uuid> = wec
            .executing_activities()
            .into_iter()
            .filter(|id| wec.bookmarks_of(*id).next().is_none())
            .collect();
        if !interrupted.is_empty() {
            debug!(count = interrupted.len(), "seeding interrupted contexts");
            for aec_id in interrupted {
                let node_id = wec
                    .activity_context(aec_id)
                    .map(|aec| aec.node_id.clone())
                    .ok_or(EngineError::ContextNotFound(aec_id))?;
                schedule_seed(wec, WorkItem::resume(node_id, aec_id));
            }
            return Ok(());
        }

        debug!("seeding fresh start");
        schedule_seed(wec, WorkItem::start(graph.root_id().clone()));
        Ok(())
    }

    fn seed_from_handle(
        &self,
        wec: &mut WorkflowExecutionContext,
        graph: &Arc<WorkflowGraph>,
        handle: &ActivityHandle,
        _options: &RunWorkflowOptions,
    ) -> Result<(), EngineError> {
        if let Some(aec_id) = handle.activity_instance_id {
            let node_id = wec
                .activity_context(aec_id)
                .map(|aec| aec.node_id.clone())
                .ok_or(EngineError::ContextNotFound(aec_id))?;
            debug!(%aec_id, "seeding existing context from handle");
            schedule_seed(wec, WorkItem::resume(node_id, aec_id));
            return Ok(());
        }

        let node_id: Option<NodeId> = handle
            .node_id
            .clone()
            .filter(|node_id| graph.contains(node_id))
            .or_else(|| {
                handle
                    .activity_id
                    .as_deref()
                    .and_then(|id| graph.find_by_activity_id(id).cloned())
            })
            .or_else(|| {
                handle
                    .name
                    .as_deref()
                    .and_then(|name| graph.find_by_name(name).cloned())
            });

        let node_id =
            node_id.ok_or_else(|| EngineError::ActivityNotFound(handle.describe()))?;
        debug!(node_id = %node_id, "seeding activity from handle");
        schedule_seed(wec, WorkItem::start(node_id));
        Ok(())
    }

    /// Fold recognized options into the execution context
    fn apply_options(&self, wec: &mut WorkflowExecutionContext, options: &RunWorkflowOptions) {
        if let Some(correlation_id) = &options.correlation_id {
            wec.correlation_id = Some(correlation_id.clone());
        }
        if let Some(parent_id) = options.parent_workflow_instance_id {
            wec.parent_instance_id = Some(parent_id);
        }
        if let Some(tenant_id) = &options.tenant_id {
            wec.tenant_id = Some(tenant_id.clone());
        }
        if let Some(trigger) = &options.trigger_activity_id {
            wec.properties.insert(
                "trigger_activity_id".to_string(),
                serde_json::Value::String(trigger.clone()),
            );
        }
        for (name, value) in &options.input {
            wec.input.insert(name.clone(), value.clone());
        }
        for (name, value) in &options.properties {
            wec.properties.insert(name.clone(), value.clone());
        }
        // Dynamic variables bind at the root: an existing root block is
        // updated, anything else becomes a dynamic binding. Declarations
        // deeper in the tree are never shadowed from here.
        for (name, value) in &options.variables {
            wec.set_variable(None, &BlockId::new(name.clone()), value.clone());
        }
        if let Some(token) = &options.cancellation {
            wec.cancellation = token.clone();
        }
    }

    /// Run the pipeline and surrounding lifecycle for one turn
    async fn execute_turn(
        &self,
        mut wec: WorkflowExecutionContext,
        workflow: Arc<Workflow>,
    ) -> Result<RunResult, EngineError> {
        {
            let mut run = WorkflowRun {
                wec: &mut wec,
                services: &self.services,
            };

            let executing = WorkflowNotification::WorkflowExecuting {
                instance_id: run.wec.instance_id,
                definition_id: run.wec.definition_id.clone(),
            };
            notify(run.services, run.wec, executing).await;

            let was_pending = run.wec.sub_status == WorkflowSubStatus::Pending;
            if !run.wec.is_terminal() || run.wec.scheduler.has_any() {
                run.wec.transition(WorkflowSubStatus::Executing);
            }
            if was_pending {
                run.wec.record(ExecutionLogEvent::WorkflowStarted, None);
                let started = WorkflowNotification::WorkflowStarted {
                    instance_id: run.wec.instance_id,
                };
                notify(run.services, run.wec, started).await;
            }

            let pipeline_result = self.pipeline.invoke(&mut run).await;

            if run.wec.status == WorkflowStatus::Finished {
                let finished = WorkflowNotification::WorkflowFinished {
                    instance_id: run.wec.instance_id,
                    sub_status: run.wec.sub_status,
                };
                notify(run.services, run.wec, finished).await;
            }
            let executed = WorkflowNotification::WorkflowExecuted {
                instance_id: run.wec.instance_id,
                sub_status: run.wec.sub_status,
            };
            notify(run.services, run.wec, executed).await;

            pipeline_result?;
        }

        let state = extract(&wec);
        self.services.committer.commit(&state).await?;

        let result = workflow
            .result_variable
            .as_ref()
            .and_then(|name| wec.get_variable(None, &BlockId::new(name.clone())));

        info!(
            instance_id = %wec.instance_id,
            status = %wec.status,
            sub_status = %wec.sub_status,
            "turn complete"
        );

        Ok(RunResult {
            workflow_execution_context: wec,
            workflow_state: state,
            workflow,
            result,
        })
    }
}

fn schedule_seed(wec: &mut WorkflowExecutionContext, item: WorkItem) {
    wec.record(
        ExecutionLogEvent::ActivityScheduled {
            node_id: item.node_id.clone(),
        },
        item.existing_aec_id,
    );
    wec.scheduler.schedule(item);
}

/// Builds a [`WorkflowRunner`] with custom collaborators and middleware
pub struct WorkflowRunnerBuilder {
    services: ExecutionServices,
    workflow_middlewares: Vec<Arc<dyn WorkflowMiddleware>>,
    activity_middlewares: Vec<Arc<dyn ActivityMiddleware>>,
}

impl WorkflowRunnerBuilder {
    fn new(registry: ActivityRegistry) -> Self {
        Self {
            services: ExecutionServices::new(registry),
            workflow_middlewares: Vec::new(),
            activity_middlewares: Vec::new(),
        }
    }

    /// Set the notification sender
    pub fn notifications(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.services.notifications = sender;
        self
    }

    /// Set the identifier generator
    pub fn identity(mut self, identity: Arc<dyn IdentityGenerator>) -> Self {
        self.services.identity = identity;
        self
    }

    /// Set the storage driver registry
    pub fn storage_drivers(mut self, drivers: Arc<StorageDriverRegistry>) -> Self {
        self.services.storage_drivers = drivers;
        self
    }

    /// Set the commit handler
    pub fn committer(mut self, committer: Arc<dyn CommitHandler>) -> Self {
        self.services.committer = committer;
        self
    }

    /// Append a workflow middleware after the built-in logging scope
    pub fn workflow_middleware(mut self, middleware: Arc<dyn WorkflowMiddleware>) -> Self {
        self.workflow_middlewares.push(middleware);
        self
    }

    /// Append an activity middleware after the built-in checkpoint
    pub fn activity_middleware(mut self, middleware: Arc<dyn ActivityMiddleware>) -> Self {
        self.activity_middlewares.push(middleware);
        self
    }

    /// Assemble the runner
    pub fn build(self) -> WorkflowRunner {
        let mut activity_middlewares: Vec<Arc<dyn ActivityMiddleware>> =
            vec![Arc::new(CheckpointMiddleware)];
        activity_middlewares.extend(self.activity_middlewares);

        let mut workflow_middlewares: Vec<Arc<dyn WorkflowMiddleware>> =
            vec![Arc::new(LoggingScopeMiddleware)];
        workflow_middlewares.extend(self.workflow_middlewares);

        let drain = ActivityDrain::new(activity_middlewares);
        let pipeline = WorkflowPipeline::new(workflow_middlewares, Arc::new(drain));

        WorkflowRunner {
            services: self.services,
            pipeline,
        }
    }
}
