//! Built-in middlewares

use async_trait::async_trait;
use tracing::Instrument;

use super::activity::{ActivityInvocation, ActivityMiddleware, ActivityNext};
use super::workflow::{Next, WorkflowMiddleware, WorkflowRun};
use crate::error::EngineError;
use crate::state::extract;

/// Opens a tracing span carrying run identity around the rest of the turn
#[derive(Debug, Clone, Default)]
pub struct LoggingScopeMiddleware;

#[async_trait]
impl WorkflowMiddleware for LoggingScopeMiddleware {
    async fn handle(
        &self,
        run: &mut WorkflowRun<'_>,
        next: Next<'_>,
    ) -> Result<(), EngineError> {
        let span = tracing::info_span!(
            "workflow_turn",
            instance_id = %run.wec.instance_id,
            definition_id = %run.wec.definition_id,
            correlation_id = run.wec.correlation_id.as_deref().unwrap_or(""),
        );
        next.run(run).instrument(span).await
    }
}

/// Commits a snapshot before each activity callback runs
///
/// This is the engine's unit-of-work boundary: the popped work item is
/// already gone from the queue and the execution context is marked as
/// executing, so a crash after the commit leaves a snapshot the runner can
/// resume by rescheduling the in-flight context. A failing committer
/// aborts the turn.
#[derive(Debug, Clone, Default)]
pub struct CheckpointMiddleware;

#[async_trait]
impl ActivityMiddleware for CheckpointMiddleware {
    async fn handle(
        &self,
        invocation: &mut ActivityInvocation<'_>,
        next: ActivityNext<'_>,
    ) -> Result<(), EngineError> {
        let state = extract(invocation.wec);
        invocation.services.committer.commit(&state).await?;
        next.run(invocation).await
    }
}
