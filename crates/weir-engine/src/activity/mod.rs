//! Activity runtime
//!
//! - [`ActivityHandler`]: the capability trait activity implementations
//!   satisfy, dispatched by registered type name
//! - [`ActivityExecutionContext`]: per-execution runtime state
//! - [`ActivityScope`]: the handle callbacks operate through

mod context;
mod handler;
mod scope;

pub use context::ActivityExecutionContext;
pub use handler::{ActivityHandler, ActivityMetadata, ChildCompleted, Resumption};
pub use scope::{ActivityScope, ScheduleChildOptions};
