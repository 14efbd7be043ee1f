//! Workflow state snapshots
//!
//! [`extract`] renders a workflow execution context into the serializable
//! [`WorkflowState`]; [`apply`] rebuilds an equivalent context from a
//! snapshot and the matching graph. The two are inverses over every
//! persisted field: `apply(extract(wec), graph)` observes equal to `wec`.

mod apply;
mod extract;
mod model;

pub use apply::apply;
pub use extract::extract;
pub use model::{ActivityContextRecord, WorkflowState, STATE_FORMAT_VERSION};
