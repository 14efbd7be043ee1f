//! State application

use std::sync::Arc;

use super::model::WorkflowState;
use crate::activity::ActivityExecutionContext;
use crate::error::EngineError;
use crate::graph::WorkflowGraph;
use crate::workflow::WorkflowExecutionContext;

/// Rebuild an executable workflow execution context from a snapshot
///
/// Activity contexts are reconstructed in the recorded order, parents
/// re-wired via their recorded ids, variables rebound, bookmarks restored,
/// and the scheduler queue replayed without executing it. Fails when the
/// snapshot references a node the graph no longer contains.
pub fn apply(
    state: WorkflowState,
    graph: Arc<WorkflowGraph>,
) -> Result<WorkflowExecutionContext, EngineError> {
    for record in &state.activity_execution_contexts {
        if !graph.contains(&record.node_id) {
            return Err(EngineError::ActivityNotFound(
                record.node_id.as_str().to_string(),
            ));
        }
    }
    for item in &state.scheduler {
        if !graph.contains(&item.node_id) {
            return Err(EngineError::ScheduleRejected(
                item.node_id.as_str().to_string(),
            ));
        }
    }

    let mut wec = WorkflowExecutionContext::new(graph, state.instance_id);
    wec.definition_id = state.definition_id;
    wec.definition_version = state.definition_version;
    wec.correlation_id = state.correlation_id;
    wec.parent_instance_id = state.parent_instance_id;
    wec.tenant_id = state.tenant_id;
    wec.status = state.status;
    wec.sub_status = state.sub_status;
    wec.input = state.input;
    wec.output = state.output;
    wec.properties = state.properties;

    // Recorded root bindings replace declaration defaults wholesale
    for (id, block) in state.variables {
        wec.root_register.insert(id, block);
    }

    for record in state.activity_execution_contexts {
        let mut aec = ActivityExecutionContext::new(record.id, record.node_id, record.parent_id);
        aec.status = record.status;
        aec.is_executing = record.is_executing;
        aec.tag = record.tag;
        aec.outcome = record.outcome;
        aec.input = record.input;
        aec.output = record.output;
        aec.properties = record.properties;
        aec.started_at = record.started_at;
        aec.completed_at = record.completed_at;
        for (id, block) in record.variables {
            aec.register.insert(id, block);
        }
        wec.add_activity_context(aec);
    }

    // Orphaned parent links would break the forest invariant
    let orphan = wec
        .activity_contexts()
        .find_map(|aec| match aec.parent_id {
            Some(parent_id) if wec.activity_context(parent_id).is_none() => Some(parent_id),
            _ => None,
        });
    if let Some(parent_id) = orphan {
        return Err(EngineError::ContextNotFound(parent_id));
    }

    wec.bookmarks = state.bookmarks;
    wec.incidents = state.incidents;
    wec.journal = state.execution_log;
    wec.scheduler.replace(state.scheduler);

    Ok(wec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActivityNode, Workflow};
    use crate::scheduler::WorkItem;
    use crate::state::extract;
    use uuid::Uuid;

    fn graph() -> Arc<WorkflowGraph> {
        let root = ActivityNode::new("seq", "sequence")
            .with_child("activities", ActivityNode::new("a", "write_line"));
        Arc::new(WorkflowGraph::new(Arc::new(Workflow::new("demo", root))))
    }

    #[test]
    fn test_apply_rejects_unknown_nodes() {
        let source = graph();
        let mut wec = WorkflowExecutionContext::new(source.clone(), Uuid::now_v7());
        wec.scheduler.schedule(WorkItem::start("seq:missing".into()));
        let state = extract(&wec);

        let result = apply(state, source);
        assert!(matches!(result, Err(EngineError::ScheduleRejected(_))));
    }

    #[test]
    fn test_apply_rebuilds_equivalent_context() {
        let source = graph();
        let mut wec = WorkflowExecutionContext::new(source.clone(), Uuid::now_v7());
        wec.scheduler.schedule(WorkItem::start("seq".into()));
        let mut aec = ActivityExecutionContext::new(Uuid::now_v7(), "seq".into(), None);
        aec.mark_running();
        wec.add_activity_context(aec);

        let state = extract(&wec);
        let rebuilt = apply(state.clone(), source).expect("should apply");

        assert_eq!(extract(&rebuilt), state);
    }
}
