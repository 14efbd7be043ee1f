//! Run orchestration
//!
//! - [`WorkflowRunner`]: builds or rehydrates an execution context, seeds
//!   the scheduler per caller intent, runs the pipeline, commits state
//! - [`RunWorkflowOptions`] / [`ActivityHandle`]: the caller surface
//! - [`RunResult`]: everything a turn produces

mod options;
mod result;
mod workflow_runner;

pub use options::{ActivityHandle, RunWorkflowOptions};
pub use result::RunResult;
pub use workflow_runner::{WorkflowRunner, WorkflowRunnerBuilder};
