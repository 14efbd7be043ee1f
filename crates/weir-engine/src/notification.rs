//! Lifecycle notifications
//!
//! The engine emits notifications at fixed points in every turn, in a
//! strict order observers can rely on:
//!
//! 1. `WorkflowExecuting`: after scope setup, before the pipeline
//! 2. `WorkflowStarted`: only on the `Pending` → `Executing` transition
//! 3. `ActivityExecuting` / `ActivityExecuted`: around every callback
//! 4. `WorkflowFinished`: only when the post-pipeline status is finished
//! 5. `WorkflowExecuted`: always after the pipeline, before commit
//!
//! Senders run synchronously within the turn. A failing sender becomes an
//! incident on the workflow; it never corrupts run state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::NodeId;
use crate::workflow::{ActivityStatus, WorkflowSubStatus};

/// A lifecycle event emitted during a workflow turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowNotification {
    /// A turn is starting
    WorkflowExecuting {
        instance_id: Uuid,
        definition_id: String,
    },

    /// The workflow took its first tick
    WorkflowStarted { instance_id: Uuid },

    /// An activity callback is about to run
    ActivityExecuting {
        instance_id: Uuid,
        activity_instance_id: Uuid,
        node_id: NodeId,
        type_name: String,
    },

    /// An activity callback returned (even on fault)
    ActivityExecuted {
        instance_id: Uuid,
        activity_instance_id: Uuid,
        node_id: NodeId,
        status: ActivityStatus,
    },

    /// The workflow reached a terminal sub-status this turn
    WorkflowFinished {
        instance_id: Uuid,
        sub_status: WorkflowSubStatus,
    },

    /// The turn ended
    WorkflowExecuted {
        instance_id: Uuid,
        sub_status: WorkflowSubStatus,
    },
}

impl WorkflowNotification {
    /// Stable kind tag, useful for filtering and assertions
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WorkflowExecuting { .. } => "workflow_executing",
            Self::WorkflowStarted { .. } => "workflow_started",
            Self::ActivityExecuting { .. } => "activity_executing",
            Self::ActivityExecuted { .. } => "activity_executed",
            Self::WorkflowFinished { .. } => "workflow_finished",
            Self::WorkflowExecuted { .. } => "workflow_executed",
        }
    }
}

/// Error from a notification subscriber
#[derive(Debug, thiserror::Error)]
#[error("notification sender failed: {0}")]
pub struct NotificationError(pub String);

/// Receives lifecycle notifications synchronously within the turn
///
/// Senders should be fast and non-blocking; heavy work belongs in spawned
/// tasks. Errors are recorded as incidents on the emitting workflow.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Handle one notification
    async fn send(&self, notification: &WorkflowNotification) -> Result<(), NotificationError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str {
        "NotificationSender"
    }
}

/// Sender that drops everything
#[derive(Debug, Clone, Default)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send(&self, _notification: &WorkflowNotification) -> Result<(), NotificationError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoopNotificationSender"
    }
}

/// Fans notifications out to multiple senders in registration order
#[derive(Default)]
pub struct CompositeNotificationSender {
    senders: Vec<std::sync::Arc<dyn NotificationSender>>,
}

impl CompositeNotificationSender {
    /// Create an empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sender
    pub fn push(&mut self, sender: std::sync::Arc<dyn NotificationSender>) {
        self.senders.push(sender);
    }
}

#[async_trait]
impl NotificationSender for CompositeNotificationSender {
    async fn send(&self, notification: &WorkflowNotification) -> Result<(), NotificationError> {
        for sender in &self.senders {
            sender.send(notification).await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CompositeNotificationSender"
    }
}

/// Sender that records every notification, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingNotificationSender {
    received: parking_lot::Mutex<Vec<WorkflowNotification>>,
}

impl RecordingNotificationSender {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far
    pub fn received(&self) -> Vec<WorkflowNotification> {
        self.received.lock().clone()
    }

    /// Kind tags of all notifications received so far
    pub fn kinds(&self) -> Vec<&'static str> {
        self.received.lock().iter().map(|n| n.kind()).collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send(&self, notification: &WorkflowNotification) -> Result<(), NotificationError> {
        self.received.lock().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RecordingNotificationSender"
    }
}
