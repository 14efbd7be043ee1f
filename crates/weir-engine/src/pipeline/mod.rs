//! Execution pipelines
//!
//! Two middleware chains wrap execution, both shaped `m1 ∘ m2 ∘ … ∘
//! terminal`:
//!
//! - the **workflow pipeline** runs once per turn around the activity
//!   drain (logging scope, custom host middleware)
//! - the **activity pipeline** runs around each activity callback
//!   (checkpoint commits, custom host middleware)
//!
//! Middlewares pass through or short-circuit; they never reorder the
//! scheduler.

mod activity;
mod middleware;
mod workflow;

pub use activity::{
    ActivityInvocation, ActivityMiddleware, ActivityNext, ActivityPipeline, ActivityTerminal,
};
pub use middleware::{CheckpointMiddleware, LoggingScopeMiddleware};
pub use workflow::{Next, WorkflowMiddleware, WorkflowPipeline, WorkflowRun, WorkflowTerminal};
