//! State extraction

use std::collections::HashMap;

use super::model::{ActivityContextRecord, WorkflowState, STATE_FORMAT_VERSION};
use crate::memory::{BlockId, MemoryBlock, MemoryRegister};
use crate::workflow::WorkflowExecutionContext;

fn persistent_blocks(register: &MemoryRegister) -> HashMap<BlockId, MemoryBlock> {
    register
        .iter_persistent()
        .map(|(id, block)| (id.clone(), block.clone()))
        .collect()
}

/// Render a workflow execution context into its persisted form
///
/// The walk records activity contexts in creation order so the applicator
/// can rebuild parents before children without sorting. Transient variable
/// blocks are dropped; everything else is copied verbatim.
pub fn extract(wec: &WorkflowExecutionContext) -> WorkflowState {
    let activity_execution_contexts = wec
        .activity_contexts()
        .map(|aec| ActivityContextRecord {
            id: aec.id,
            node_id: aec.node_id.clone(),
            parent_id: aec.parent_id,
            status: aec.status,
            is_executing: aec.is_executing,
            tag: aec.tag.clone(),
            outcome: aec.outcome.clone(),
            input: aec.input.clone(),
            output: aec.output.clone(),
            properties: aec.properties.clone(),
            variables: persistent_blocks(&aec.register),
            started_at: aec.started_at,
            completed_at: aec.completed_at,
        })
        .collect();

    WorkflowState {
        state_format_version: STATE_FORMAT_VERSION,
        instance_id: wec.instance_id,
        definition_id: wec.definition_id.clone(),
        definition_version: wec.definition_version,
        correlation_id: wec.correlation_id.clone(),
        parent_instance_id: wec.parent_instance_id,
        tenant_id: wec.tenant_id.clone(),
        status: wec.status,
        sub_status: wec.sub_status,
        input: wec.input.clone(),
        output: wec.output.clone(),
        properties: wec.properties.clone(),
        variables: persistent_blocks(&wec.root_register),
        activity_execution_contexts,
        bookmarks: wec.bookmarks.clone(),
        incidents: wec.incidents.clone(),
        scheduler: wec.scheduler.iter().cloned().collect(),
        execution_log: wec.journal.clone(),
    }
}
