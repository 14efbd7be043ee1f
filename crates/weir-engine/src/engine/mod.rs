//! Engine core
//!
//! - [`ExecutionServices`]: the injected collaborators a runner carries;
//!   the engine holds no process-global state
//! - [`ActivityRegistry`]: type-name dispatch to activity handlers
//! - [`ActivityDrain`]: the terminal pipeline stage that drains the
//!   scheduler

mod drain;
mod registry;

use std::sync::Arc;

pub use drain::ActivityDrain;
pub use registry::ActivityRegistry;

use crate::ids::{IdentityGenerator, UuidIdentityGenerator};
use crate::memory::StorageDriverRegistry;
use crate::notification::{NoopNotificationSender, NotificationSender, WorkflowNotification};
use crate::persistence::{CommitHandler, NoopCommitHandler};
use crate::workflow::{Incident, WorkflowExecutionContext};

/// Injected collaborators shared by every turn of a runner instance
#[derive(Clone)]
pub struct ExecutionServices {
    /// Activity handler dispatch
    pub registry: Arc<ActivityRegistry>,

    /// Lifecycle notification sink
    pub notifications: Arc<dyn NotificationSender>,

    /// Identifier source
    pub identity: Arc<dyn IdentityGenerator>,

    /// Storage drivers for externally-held variables
    pub storage_drivers: Arc<StorageDriverRegistry>,

    /// Snapshot commit sink
    pub committer: Arc<dyn CommitHandler>,
}

impl ExecutionServices {
    /// Services with no-op collaborators around the given registry
    pub fn new(registry: ActivityRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            notifications: Arc::new(NoopNotificationSender),
            identity: Arc::new(UuidIdentityGenerator),
            storage_drivers: Arc::new(StorageDriverRegistry::new()),
            committer: Arc::new(NoopCommitHandler),
        }
    }
}

/// Emit a notification, converting a failing subscriber into an incident
///
/// Subscriber failures never corrupt run state; they surface like any
/// other fault through the incident list.
pub(crate) async fn notify(
    services: &ExecutionServices,
    wec: &mut WorkflowExecutionContext,
    notification: WorkflowNotification,
) {
    if let Err(err) = services.notifications.send(&notification).await {
        tracing::warn!(
            sender = services.notifications.name(),
            error = %err,
            "notification sender failed"
        );
        let id = services.identity.next_id();
        wec.record_incident(Incident::detached(id, err.to_string()));
    }
}
