//! Workflow-level pipeline

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::ExecutionServices;
use crate::error::EngineError;
use crate::workflow::WorkflowExecutionContext;

/// Everything a middleware sees during one turn
pub struct WorkflowRun<'a> {
    /// The executing context
    pub wec: &'a mut WorkflowExecutionContext,

    /// Engine services for this runner instance
    pub services: &'a ExecutionServices,
}

/// A stage in the workflow pipeline
#[async_trait]
pub trait WorkflowMiddleware: Send + Sync {
    /// Handle the turn; call `next.run(run)` to continue the chain
    async fn handle(
        &self,
        run: &mut WorkflowRun<'_>,
        next: Next<'_>,
    ) -> Result<(), EngineError>;
}

/// Terminal stage of the workflow pipeline
#[async_trait]
pub trait WorkflowTerminal: Send + Sync {
    /// Run the terminal stage
    async fn run(&self, run: &mut WorkflowRun<'_>) -> Result<(), EngineError>;
}

/// Continuation handed to each middleware
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn WorkflowMiddleware>],
    terminal: &'a dyn WorkflowTerminal,
}

impl<'a> Next<'a> {
    /// Invoke the rest of the chain
    pub async fn run(self, run: &mut WorkflowRun<'_>) -> Result<(), EngineError> {
        match self.middlewares.split_first() {
            Some((head, rest)) => {
                head.handle(
                    run,
                    Next {
                        middlewares: rest,
                        terminal: self.terminal,
                    },
                )
                .await
            }
            None => self.terminal.run(run).await,
        }
    }
}

/// The composed workflow pipeline
pub struct WorkflowPipeline {
    middlewares: Vec<Arc<dyn WorkflowMiddleware>>,
    terminal: Arc<dyn WorkflowTerminal>,
}

impl WorkflowPipeline {
    /// Compose a pipeline from ordered middlewares and a terminal stage
    pub fn new(
        middlewares: Vec<Arc<dyn WorkflowMiddleware>>,
        terminal: Arc<dyn WorkflowTerminal>,
    ) -> Self {
        Self {
            middlewares,
            terminal,
        }
    }

    /// Run one turn through the chain
    pub async fn invoke(&self, run: &mut WorkflowRun<'_>) -> Result<(), EngineError> {
        Next {
            middlewares: &self.middlewares,
            terminal: self.terminal.as_ref(),
        }
        .run(run)
        .await
    }
}
