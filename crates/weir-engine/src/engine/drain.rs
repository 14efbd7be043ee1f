//! Activity drain: the terminal stage of the workflow pipeline
//!
//! The drain loops while the scheduler has work and the run is neither
//! terminal nor cancelled: pop a work item, obtain or create its execution
//! context, run the per-activity pipeline around the handler callback, and
//! propagate completions up the parent chain. Cancellation is checked
//! between pops.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{notify, ExecutionServices};
use crate::activity::{
    ActivityExecutionContext, ActivityScope, ChildCompleted, Resumption,
};
use crate::error::{ActivityFault, EngineError};
use crate::graph::FaultStrategy;
use crate::memory::{BlockId, VariableScope};
use crate::notification::WorkflowNotification;
use crate::pipeline::{
    ActivityInvocation, ActivityMiddleware, ActivityPipeline, ActivityTerminal, WorkflowRun,
    WorkflowTerminal,
};
use crate::scheduler::WorkItem;
use crate::workflow::{
    ActivityStatus, ExecutionLogEvent, Incident, WorkflowExecutionContext, WorkflowSubStatus,
};

/// Terminal stage that drains the scheduler
pub struct ActivityDrain {
    pipeline: ActivityPipeline,
}

impl ActivityDrain {
    /// Build a drain with the given per-activity middlewares
    pub fn new(middlewares: Vec<Arc<dyn ActivityMiddleware>>) -> Self {
        Self {
            pipeline: ActivityPipeline::new(middlewares, Arc::new(ActivityInvoker)),
        }
    }

    async fn execute_item(
        &self,
        run: &mut WorkflowRun<'_>,
        item: WorkItem,
    ) -> Result<(), EngineError> {
        let aec_id = match item.existing_aec_id {
            Some(id) => {
                if run.wec.activity_context(id).is_none() {
                    return Err(EngineError::ContextNotFound(id));
                }
                id
            }
            None => create_context(run, &item)?,
        };

        let (node_id, type_name) = {
            let aec = run
                .wec
                .activity_context_mut(aec_id)
                .expect("context resolved above");
            aec.mark_running();
            let node_id = aec.node_id.clone();
            let type_name = run
                .wec
                .graph()
                .node(&node_id)
                .map(|n| n.type_name.clone())
                .unwrap_or_default();
            (node_id, type_name)
        };

        // Burning happens before the callback so a checkpoint taken inside
        // the turn never persists a bookmark that is already being resumed.
        let bookmark = match item.bookmark_id {
            Some(bookmark_id) => {
                match run.wec.find_bookmark(bookmark_id).map(|b| b.auto_burn) {
                    Some(true) => run.wec.burn_bookmark(bookmark_id),
                    Some(false) => run.wec.find_bookmark(bookmark_id).cloned(),
                    None => None,
                }
            }
            None => None,
        };

        run.wec.record(
            ExecutionLogEvent::ActivityStarted {
                node_id: node_id.clone(),
            },
            Some(aec_id),
        );
        debug!(%aec_id, node_id = %node_id, type_name = %type_name, "executing activity");

        let executing = WorkflowNotification::ActivityExecuting {
            instance_id: run.wec.instance_id,
            activity_instance_id: aec_id,
            node_id: node_id.clone(),
            type_name,
        };
        notify(run.services, run.wec, executing).await;

        let mut invocation = ActivityInvocation {
            wec: &mut *run.wec,
            services: run.services,
            aec_id,
            is_resumption: item.existing_aec_id.is_some(),
            bookmark,
            input: item.input.clone(),
        };
        self.pipeline.invoke(&mut invocation).await?;

        let status = run
            .wec
            .activity_context(aec_id)
            .expect("context resolved above")
            .status;

        let executed = WorkflowNotification::ActivityExecuted {
            instance_id: run.wec.instance_id,
            activity_instance_id: aec_id,
            node_id,
            status,
        };
        notify(run.services, run.wec, executed).await;

        if !run.wec.is_terminal()
            && status.is_terminal()
            && status != ActivityStatus::Cancelled
        {
            self.propagate_terminal(run, aec_id).await?;
        }

        Ok(())
    }

    /// Walk the parent chain of a terminal context, dispatching
    /// continuations and completing parents that ran dry
    async fn propagate_terminal(
        &self,
        run: &mut WorkflowRun<'_>,
        start: Uuid,
    ) -> Result<(), EngineError> {
        let mut current = start;
        loop {
            let (parent_id, child) = {
                let aec = run
                    .wec
                    .activity_context(current)
                    .ok_or(EngineError::ContextNotFound(current))?;
                let child = ChildCompleted {
                    child_id: aec.id,
                    child_node_id: aec.node_id.clone(),
                    status: aec.status,
                    outcome: aec.outcome.clone(),
                };
                (aec.parent_id, child)
            };
            let Some(parent_id) = parent_id else {
                break;
            };

            let parent = run
                .wec
                .activity_context(parent_id)
                .ok_or(EngineError::ContextNotFound(parent_id))?;
            if parent.is_terminal() {
                break;
            }
            let parent_type = run
                .wec
                .graph()
                .node(&parent.node_id)
                .map(|n| n.type_name.clone())
                .unwrap_or_default();

            let continuation = match run.services.registry.get(&parent_type) {
                Some(handler) => {
                    let mut scope =
                        ActivityScope::new(&mut *run.wec, run.services, parent_id)
                            .ok_or(EngineError::ContextNotFound(parent_id))?;
                    handler.child_completed(&mut scope, child).await
                }
                None => Err(ActivityFault::new(format!(
                    "no handler registered for activity type `{parent_type}`"
                ))
                .with_kind("unregistered_type")),
            };

            if let Err(fault) = continuation {
                apply_fault(run.services, run.wec, parent_id, fault);
                if run.wec.is_terminal() {
                    break;
                }
                current = parent_id;
                continue;
            }

            try_auto_complete(run.wec, parent_id);

            let parent_status = run
                .wec
                .activity_context(parent_id)
                .ok_or(EngineError::ContextNotFound(parent_id))?
                .status;
            if parent_status.is_terminal() && parent_status != ActivityStatus::Cancelled {
                current = parent_id;
            } else {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowTerminal for ActivityDrain {
    async fn run(&self, run: &mut WorkflowRun<'_>) -> Result<(), EngineError> {
        while !run.wec.is_terminal() {
            if run.wec.cancellation.is_cancelled() {
                cancel_workflow(run.wec);
                break;
            }
            let Some(item) = run.wec.scheduler.take_next() else {
                break;
            };
            self.execute_item(run, item).await?;
        }

        if !run.wec.is_terminal() {
            if !run.wec.bookmarks.is_empty() || run.wec.has_executing_activities() {
                run.wec.record(ExecutionLogEvent::WorkflowSuspended, None);
                run.wec.transition(WorkflowSubStatus::Suspended);
            } else {
                run.wec.transition(WorkflowSubStatus::Finished);
            }
        }
        Ok(())
    }
}

/// Terminal stage of the per-activity pipeline: dispatch the handler and
/// trap faults into incidents
struct ActivityInvoker;

#[async_trait]
impl ActivityTerminal for ActivityInvoker {
    async fn run(&self, invocation: &mut ActivityInvocation<'_>) -> Result<(), EngineError> {
        let aec_id = invocation.aec_id;
        let type_name = {
            let aec = invocation
                .wec
                .activity_context(aec_id)
                .ok_or(EngineError::ContextNotFound(aec_id))?;
            invocation
                .wec
                .graph()
                .node(&aec.node_id)
                .map(|n| n.type_name.clone())
                .ok_or_else(|| {
                    EngineError::ScheduleRejected(aec.node_id.as_str().to_string())
                })?
        };

        let Some(handler) = invocation.services.registry.get(&type_name) else {
            apply_fault(
                invocation.services,
                invocation.wec,
                aec_id,
                ActivityFault::new(format!(
                    "no handler registered for activity type `{type_name}`"
                ))
                .with_kind("unregistered_type"),
            );
            return Ok(());
        };

        let mut scope = ActivityScope::new(&mut *invocation.wec, invocation.services, aec_id)
            .ok_or(EngineError::ContextNotFound(aec_id))?;

        if !handler.can_execute(&scope) {
            drop(scope);
            apply_fault(
                invocation.services,
                invocation.wec,
                aec_id,
                ActivityFault::new(format!("activity `{type_name}` cannot execute"))
                    .with_kind("cannot_execute"),
            );
            return Ok(());
        }

        let outcome = if invocation.is_resumption {
            let resumption = Resumption {
                bookmark: invocation.bookmark.clone(),
                input: invocation.input.clone(),
            };
            handler.resume(&mut scope, resumption).await
        } else {
            handler.execute(&mut scope).await
        };
        drop(scope);

        match outcome {
            Ok(()) => {
                // A bookmark with auto_complete = false leaves completion to
                // the handler even when no pending work remains.
                let allow_auto = invocation
                    .bookmark
                    .as_ref()
                    .map(|b| b.auto_complete)
                    .unwrap_or(true);
                if allow_auto {
                    try_auto_complete(invocation.wec, aec_id);
                }
            }
            Err(fault) => apply_fault(invocation.services, invocation.wec, aec_id, fault),
        }
        Ok(())
    }
}

/// Create an execution context for a fresh work item
fn create_context(run: &mut WorkflowRun<'_>, item: &WorkItem) -> Result<Uuid, EngineError> {
    let node = run
        .wec
        .graph()
        .node(&item.node_id)
        .cloned()
        .ok_or_else(|| EngineError::ScheduleRejected(item.node_id.as_str().to_string()))?;

    let id = run.services.identity.next_id();
    let mut aec = ActivityExecutionContext::new(id, item.node_id.clone(), item.owner_aec_id);
    aec.tag = item.tag.clone().or_else(|| node.tag.clone());
    aec.input = node.inputs.clone();
    if let Some(input) = &item.input {
        for (name, value) in input {
            aec.input.insert(name.clone(), value.clone());
        }
    }

    for variable in &node.variables {
        if variable.scope == VariableScope::Workflow {
            run.wec.root_register.declare(variable);
        } else {
            aec.register.declare(variable);
        }
    }
    if let Some(variables) = &item.variables {
        for (name, value) in variables {
            aec.register.bind_dynamic(BlockId::new(name.clone()), value.clone());
        }
    }

    run.wec.add_activity_context(aec);
    Ok(id)
}

/// Complete a running context once it owns no pending work
fn try_auto_complete(wec: &mut WorkflowExecutionContext, aec_id: Uuid) {
    let Some(aec) = wec.activity_context(aec_id) else {
        return;
    };
    if aec.status != ActivityStatus::Running {
        return;
    }
    if wec.bookmarks_of(aec_id).next().is_some() {
        return;
    }
    if wec
        .scheduler
        .iter()
        .any(|item| item.owner_aec_id == Some(aec_id) || item.existing_aec_id == Some(aec_id))
    {
        return;
    }
    if wec
        .activity_contexts()
        .any(|child| child.parent_id == Some(aec_id) && !child.is_terminal())
    {
        return;
    }

    let node_id = aec.node_id.clone();
    wec.activity_context_mut(aec_id)
        .expect("context checked above")
        .mark_completed(None);
    wec.record(
        ExecutionLogEvent::ActivityCompleted {
            node_id,
            outcome: None,
        },
        Some(aec_id),
    );
}

/// Record a fault and apply the configured fault strategy
pub(crate) fn apply_fault(
    services: &ExecutionServices,
    wec: &mut WorkflowExecutionContext,
    aec_id: Uuid,
    fault: ActivityFault,
) {
    let Some(aec) = wec.activity_context(aec_id) else {
        return;
    };
    let node_id = aec.node_id.clone();
    warn!(%aec_id, node_id = %node_id, fault = %fault, "activity faulted");

    wec.record(
        ExecutionLogEvent::ActivityFaulted {
            node_id: node_id.clone(),
            message: fault.message.clone(),
        },
        Some(aec_id),
    );
    let incident = Incident::from_fault(services.identity.next_id(), node_id, aec_id, &fault);
    wec.record_incident(incident);

    if let Some(aec) = wec.activity_context_mut(aec_id) {
        aec.mark_faulted();
    }
    wec.remove_bookmarks_of(aec_id);
    wec.scheduler
        .unschedule(|item| item.owner_aec_id == Some(aec_id) || item.existing_aec_id == Some(aec_id));

    match wec.graph().workflow().fault_strategy {
        FaultStrategy::PropagateToRoot => {
            let mut current = wec.activity_context(aec_id).and_then(|a| a.parent_id);
            while let Some(id) = current {
                let next = match wec.activity_context_mut(id) {
                    Some(parent) if !parent.is_terminal() => {
                        parent.mark_faulted();
                        parent.parent_id
                    }
                    _ => None,
                };
                wec.remove_bookmarks_of(id);
                current = next;
            }

            cancel_live_contexts(wec);
            wec.bookmarks.clear();
            wec.scheduler.clear();
            wec.transition(WorkflowSubStatus::Faulted);
        }
        FaultStrategy::Contain => {
            // parent continuations are dispatched by the drain
        }
    }
}

/// End the run on external cancellation
pub(crate) fn cancel_workflow(wec: &mut WorkflowExecutionContext) {
    cancel_live_contexts(wec);
    wec.bookmarks.clear();
    wec.scheduler.clear();
    wec.transition(WorkflowSubStatus::Cancelled);
}

/// Cancel every non-terminal context, journaling each transition
fn cancel_live_contexts(wec: &mut WorkflowExecutionContext) {
    let live: Vec<Uuid> = wec
        .activity_contexts()
        .filter(|a| !a.is_terminal())
        .map(|a| a.id)
        .collect();
    for id in live {
        let node_id = match wec.activity_context_mut(id) {
            Some(aec) => {
                let node_id = aec.node_id.clone();
                aec.mark_cancelled();
                node_id
            }
            None => continue,
        };
        wec.record(ExecutionLogEvent::ActivityCancelled { node_id }, Some(id));
    }
}
