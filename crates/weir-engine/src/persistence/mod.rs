//! Persistence boundary
//!
//! The engine extracts a serializable [`WorkflowState`](crate::state::WorkflowState)
//! and hands it to a commit handler; durable repositories live outside the
//! engine. The in-memory store here backs tests and default wiring.

mod memory;
mod store;

pub use memory::InMemoryWorkflowStateStore;
pub use store::{CommitError, CommitHandler, NoopCommitHandler, StoreError, WorkflowStateStore};
