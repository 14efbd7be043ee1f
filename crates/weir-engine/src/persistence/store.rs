//! Store and commit handler traits

use async_trait::async_trait;
use uuid::Uuid;

use crate::state::WorkflowState;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Instance not found
    #[error("workflow instance not found: {0}")]
    InstanceNotFound(Uuid),

    /// Backend failure
    #[error("store error: {0}")]
    Backend(String),
}

/// Error type for commit operations
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CommitError(pub String);

impl From<StoreError> for CommitError {
    fn from(err: StoreError) -> Self {
        Self(err.to_string())
    }
}

/// Repository for workflow state snapshots
///
/// Implementations must be thread-safe; the engine serializes turns per
/// instance, but different instances commit concurrently.
#[async_trait]
pub trait WorkflowStateStore: Send + Sync + 'static {
    /// Save a snapshot, replacing any existing one for the instance
    async fn save(&self, state: &WorkflowState) -> Result<(), StoreError>;

    /// Load the snapshot for an instance
    async fn load(&self, instance_id: Uuid) -> Result<Option<WorkflowState>, StoreError>;

    /// Delete the snapshot for an instance
    async fn delete(&self, instance_id: Uuid) -> Result<(), StoreError>;
}

/// Receives extracted state at commit points
///
/// The runner commits once per turn after the pipeline; the checkpoint
/// middleware commits before each activity callback. Both go through this
/// trait so hosts control transactional behavior.
#[async_trait]
pub trait CommitHandler: Send + Sync {
    /// Persist a snapshot
    async fn commit(&self, state: &WorkflowState) -> Result<(), CommitError>;
}

/// Commit handler that drops snapshots
#[derive(Debug, Clone, Default)]
pub struct NoopCommitHandler;

#[async_trait]
impl CommitHandler for NoopCommitHandler {
    async fn commit(&self, _state: &WorkflowState) -> Result<(), CommitError> {
        Ok(())
    }
}
