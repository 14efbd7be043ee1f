//! Fault-raising activity

use async_trait::async_trait;

use crate::activity::{ActivityHandler, ActivityScope};
use crate::error::ActivityFault;

/// Raises an activity fault
///
/// Inputs: `message` (string, defaults to `"fault"`), `kind` (string,
/// optional).
pub struct Fault;

#[async_trait]
impl ActivityHandler for Fault {
    fn type_name(&self) -> &'static str {
        "fault"
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let message = scope
            .input_string("message")
            .unwrap_or_else(|| "fault".to_string());
        let mut fault = ActivityFault::new(message);
        if let Some(kind) = scope.input_string("kind") {
            fault = fault.with_kind(kind);
        }
        Err(fault)
    }
}
