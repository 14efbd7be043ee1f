//! Per-activity pipeline

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::engine::ExecutionServices;
use crate::error::EngineError;
use crate::workflow::{Bookmark, WorkflowExecutionContext};

/// Everything a middleware sees around one activity callback
pub struct ActivityInvocation<'a> {
    /// The executing context
    pub wec: &'a mut WorkflowExecutionContext,

    /// Engine services for this runner instance
    pub services: &'a ExecutionServices,

    /// The execution context being invoked
    pub aec_id: Uuid,

    /// Whether this invocation resumes an existing execution
    pub is_resumption: bool,

    /// The bookmark driving the resumption, if any
    pub bookmark: Option<Bookmark>,

    /// Caller-supplied resumption input
    pub input: Option<Map<String, Value>>,
}

/// A stage in the per-activity pipeline
#[async_trait]
pub trait ActivityMiddleware: Send + Sync {
    /// Handle the invocation; call `next.run(invocation)` to continue
    async fn handle(
        &self,
        invocation: &mut ActivityInvocation<'_>,
        next: ActivityNext<'_>,
    ) -> Result<(), EngineError>;
}

/// Terminal stage of the per-activity pipeline
#[async_trait]
pub trait ActivityTerminal: Send + Sync {
    /// Run the terminal stage
    async fn run(&self, invocation: &mut ActivityInvocation<'_>) -> Result<(), EngineError>;
}

/// Continuation handed to each activity middleware
pub struct ActivityNext<'a> {
    middlewares: &'a [Arc<dyn ActivityMiddleware>],
    terminal: &'a dyn ActivityTerminal,
}

impl<'a> ActivityNext<'a> {
    /// Invoke the rest of the chain
    pub async fn run(self, invocation: &mut ActivityInvocation<'_>) -> Result<(), EngineError> {
        match self.middlewares.split_first() {
            Some((head, rest)) => {
                head.handle(
                    invocation,
                    ActivityNext {
                        middlewares: rest,
                        terminal: self.terminal,
                    },
                )
                .await
            }
            None => self.terminal.run(invocation).await,
        }
    }
}

/// The composed per-activity pipeline
pub struct ActivityPipeline {
    middlewares: Vec<Arc<dyn ActivityMiddleware>>,
    terminal: Arc<dyn ActivityTerminal>,
}

impl ActivityPipeline {
    /// Compose a pipeline from ordered middlewares and a terminal stage
    pub fn new(
        middlewares: Vec<Arc<dyn ActivityMiddleware>>,
        terminal: Arc<dyn ActivityTerminal>,
    ) -> Self {
        Self {
            middlewares,
            terminal,
        }
    }

    /// Run one activity invocation through the chain
    pub async fn invoke(&self, invocation: &mut ActivityInvocation<'_>) -> Result<(), EngineError> {
        ActivityNext {
            middlewares: &self.middlewares,
            terminal: self.terminal.as_ref(),
        }
        .run(invocation)
        .await
    }
}
