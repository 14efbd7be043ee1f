//! In-memory implementation of the state store for testing

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::{CommitError, CommitHandler, StoreError, WorkflowStateStore};
use crate::state::WorkflowState;

/// In-memory state store
///
/// Primarily for testing and default wiring. Stores snapshots keyed by
/// instance id with the same replace-on-save semantics expected of durable
/// implementations.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStateStore {
    states: RwLock<HashMap<Uuid, WorkflowState>>,
}

impl InMemoryWorkflowStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored instances
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        self.states.write().clear();
    }
}

#[async_trait]
impl WorkflowStateStore for InMemoryWorkflowStateStore {
    async fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        self.states.write().insert(state.instance_id, state.clone());
        Ok(())
    }

    async fn load(&self, instance_id: Uuid) -> Result<Option<WorkflowState>, StoreError> {
        Ok(self.states.read().get(&instance_id).cloned())
    }

    async fn delete(&self, instance_id: Uuid) -> Result<(), StoreError> {
        self.states.write().remove(&instance_id);
        Ok(())
    }
}

#[async_trait]
impl CommitHandler for InMemoryWorkflowStateStore {
    async fn commit(&self, state: &WorkflowState) -> Result<(), CommitError> {
        self.save(state).await.map_err(CommitError::from)
    }
}
