//! Activity handler trait

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::ActivityScope;
use crate::error::ActivityFault;
use crate::graph::NodeId;
use crate::workflow::{ActivityStatus, Bookmark};

/// Static description of a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMetadata {
    /// Registered type name
    pub type_name: String,

    /// Human-readable description
    pub description: Option<String>,

    /// Whether the handler schedules children
    pub composite: bool,
}

impl ActivityMetadata {
    /// Metadata for a leaf handler
    pub fn leaf(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            description: None,
            composite: false,
        }
    }

    /// Metadata for a composite handler
    pub fn composite(type_name: impl Into<String>) -> Self {
        Self {
            composite: true,
            ..Self::leaf(type_name)
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Context passed to [`ActivityHandler::resume`]
#[derive(Debug, Clone, Default)]
pub struct Resumption {
    /// The bookmark being resumed, if resumption came through one
    pub bookmark: Option<Bookmark>,

    /// Input supplied by the resuming caller
    pub input: Option<Map<String, Value>>,
}

/// Context passed to [`ActivityHandler::child_completed`]
#[derive(Debug, Clone)]
pub struct ChildCompleted {
    /// Execution context of the terminal child
    pub child_id: Uuid,

    /// Node of the terminal child
    pub child_node_id: NodeId,

    /// Terminal status of the child
    pub status: ActivityStatus,

    /// Completion outcome, when the child completed
    pub outcome: Option<String>,
}

/// Behavior of one activity type
///
/// Handlers are stateless values dispatched by registered type name; all
/// per-execution state lives on the activity execution context reachable
/// through the scope. A handler either completes its activity inside the
/// callback (explicitly, or implicitly when it leaves no pending work) or
/// suspends by creating bookmarks or scheduling children and returning.
#[async_trait]
pub trait ActivityHandler: Send + Sync {
    /// Registered type name, unique per registry
    fn type_name(&self) -> &'static str;

    /// Describe the handler
    fn metadata(&self) -> ActivityMetadata {
        ActivityMetadata::leaf(self.type_name())
    }

    /// Whether the activity can execute in the current state
    fn can_execute(&self, scope: &ActivityScope<'_>) -> bool {
        let _ = scope;
        true
    }

    /// Execute the activity
    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault>;

    /// Resume a previously-started execution
    ///
    /// The default re-invokes [`execute`](Self::execute); composites keep
    /// their progress in execution-context properties so re-execution
    /// replays deterministically. Bookmark-driven handlers override this.
    async fn resume(
        &self,
        scope: &mut ActivityScope<'_>,
        resumption: Resumption,
    ) -> Result<(), ActivityFault> {
        let _ = resumption;
        self.execute(scope).await
    }

    /// React to a child reaching a terminal status
    ///
    /// The default does nothing; the engine completes the parent once no
    /// pending work remains. Sequential composites override this to
    /// schedule their next child.
    async fn child_completed(
        &self,
        scope: &mut ActivityScope<'_>,
        child: ChildCompleted,
    ) -> Result<(), ActivityFault> {
        let _ = (scope, child);
        Ok(())
    }
}
