//! Work item scheduler
//!
//! The scheduler is a FIFO queue of [`WorkItem`]s drained once per workflow
//! turn. Composite activities may prepend so their children run before
//! sibling work scheduled earlier by ancestors (depth-first descent).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::graph::NodeId;

/// The intent to start a new activity execution or resume an existing one
///
/// When `existing_aec_id` is set the item resumes that execution context and
/// never creates a new one; `bookmark_id` additionally names the bookmark
/// being resumed so a queued resumption survives a suspend/extract/apply
/// round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Node to execute
    pub node_id: NodeId,

    /// Execution context that scheduled this item, if any
    pub owner_aec_id: Option<Uuid>,

    /// Execution context to resume instead of creating a new one
    pub existing_aec_id: Option<Uuid>,

    /// Bookmark being resumed, if this item is a bookmark resumption
    pub bookmark_id: Option<Uuid>,

    /// Tag copied onto the created execution context
    pub tag: Option<String>,

    /// Input overrides merged over the node's literal inputs
    pub input: Option<Map<String, Value>>,

    /// Dynamic variables bound into the created execution context's register
    pub variables: Option<Map<String, Value>>,
}

impl WorkItem {
    /// An item that starts a fresh execution of the node
    pub fn start(node_id: NodeId) -> Self {
        Self {
            node_id,
            owner_aec_id: None,
            existing_aec_id: None,
            bookmark_id: None,
            tag: None,
            input: None,
            variables: None,
        }
    }

    /// An item that resumes an existing execution context
    pub fn resume(node_id: NodeId, aec_id: Uuid) -> Self {
        Self {
            existing_aec_id: Some(aec_id),
            ..Self::start(node_id)
        }
    }

    /// Set the scheduling owner
    pub fn with_owner(mut self, aec_id: Uuid) -> Self {
        self.owner_aec_id = Some(aec_id);
        self
    }

    /// Set the resumed bookmark
    pub fn with_bookmark(mut self, bookmark_id: Uuid) -> Self {
        self.bookmark_id = Some(bookmark_id);
        self
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

    /// Set seed variables
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Ordered queue of pending work items
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: VecDeque<WorkItem>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item (FIFO order)
    pub fn schedule(&mut self, item: WorkItem) {
        self.queue.push_back(item);
    }

    /// Insert an item at the front of the queue
    pub fn schedule_first(&mut self, item: WorkItem) {
        self.queue.push_front(item);
    }

    /// Insert a block of items at the front, preserving their relative order
    pub fn schedule_many_first(&mut self, items: Vec<WorkItem>) {
        for item in items.into_iter().rev() {
            self.queue.push_front(item);
        }
    }

    /// Remove all items matching the predicate
    pub fn unschedule(&mut self, mut predicate: impl FnMut(&WorkItem) -> bool) {
        self.queue.retain(|item| !predicate(item));
    }

    /// Pop the next item
    pub fn take_next(&mut self) -> Option<WorkItem> {
        self.queue.pop_front()
    }

    /// Whether any work is pending
    pub fn has_any(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all pending items
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Iterate pending items in execution order
    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.queue.iter()
    }

    /// Replace the queue contents (state rehydration)
    pub fn replace(&mut self, items: Vec<WorkItem>) {
        self.queue = items.into();
    }
}
