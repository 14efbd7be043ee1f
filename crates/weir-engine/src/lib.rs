//! # Weir Workflow Engine
//!
//! The core execution engine for workflow definitions: given a graph of
//! activities, a runner drives it to completion or to a suspension point,
//! maintaining all intermediate state, honoring scheduling order,
//! propagating data and control between activities, persisting resumable
//! snapshots, and emitting lifecycle notifications.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  (seeds the scheduler, runs the pipeline, commits state)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WorkflowPipeline                         │
//! │  (logging scope → … → ActivityDrain)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                WorkflowExecutionContext                     │
//! │  (activity contexts, scheduler, bookmarks, registers,       │
//! │   incidents, journal)                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single instance runs on one logical thread per turn; different
//! instances are independent. Suspension happens through bookmarks or
//! pending children; the extracted [`WorkflowState`](state::WorkflowState)
//! round-trips through [`state::apply`] into an equivalent context.
//!
//! ## Example
//!
//! ```ignore
//! use weir_engine::prelude::*;
//!
//! let workflow = Arc::new(Workflow::new(
//!     "greet",
//!     ActivityNode::new("root", "sequence")
//!         .with_child("activities", ActivityNode::new("hello", "set_variable")
//!             .with_input("name", json!("greeting"))
//!             .with_input("value", json!("hello world"))),
//! ));
//!
//! let runner = WorkflowRunner::new(activities::default_registry());
//! let result = runner.run(workflow, RunWorkflowOptions::new()).await?;
//! assert_eq!(result.workflow_state.sub_status, WorkflowSubStatus::Finished);
//! ```

pub mod activities;
pub mod activity;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ids;
pub mod memory;
pub mod notification;
pub mod persistence;
pub mod pipeline;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod workflow;

/// Prelude for common imports
pub mod prelude {
    pub use crate::activities;
    pub use crate::activity::{
        ActivityHandler, ActivityScope, ChildCompleted, Resumption, ScheduleChildOptions,
    };
    pub use crate::engine::{ActivityRegistry, ExecutionServices};
    pub use crate::error::{ActivityFault, EngineError};
    pub use crate::graph::{ActivityNode, FaultStrategy, NodeId, Workflow, WorkflowGraph};
    pub use crate::memory::{Variable, VariableScope};
    pub use crate::notification::{NotificationSender, WorkflowNotification};
    pub use crate::persistence::{CommitHandler, InMemoryWorkflowStateStore, WorkflowStateStore};
    pub use crate::runner::{ActivityHandle, RunResult, RunWorkflowOptions, WorkflowRunner};
    pub use crate::state::WorkflowState;
    pub use crate::workflow::{
        ActivityStatus, Bookmark, BookmarkOptions, WorkflowExecutionContext, WorkflowStatus,
        WorkflowSubStatus,
    };
}

// Re-export key types at crate root
pub use activity::{ActivityHandler, ActivityScope};
pub use engine::{ActivityRegistry, ExecutionServices};
pub use error::{ActivityFault, EngineError};
pub use graph::{ActivityNode, Workflow, WorkflowGraph};
pub use runner::{RunResult, RunWorkflowOptions, WorkflowRunner};
pub use state::WorkflowState;
pub use workflow::WorkflowExecutionContext;
