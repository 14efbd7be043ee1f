//! Parallel composite

use async_trait::async_trait;

use crate::activity::{
    ActivityHandler, ActivityMetadata, ActivityScope, ScheduleChildOptions,
};
use crate::error::ActivityFault;

/// Schedules all children at once
///
/// Branches still execute one at a time on the run's single logical
/// thread, in declaration order; the composite completes once every child
/// reaches a terminal status. No continuation override is needed; the
/// engine completes the composite when its last pending child ends.
pub struct Parallel;

#[async_trait]
impl ActivityHandler for Parallel {
    fn type_name(&self) -> &'static str {
        "parallel"
    }

    fn metadata(&self) -> ActivityMetadata {
        ActivityMetadata::composite("parallel")
            .with_description("Runs child activities as independent branches")
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let children = scope.child_node_ids();
        if children.is_empty() {
            scope.complete();
            return Ok(());
        }
        scope.schedule_children(&children, ScheduleChildOptions::prepend())
    }
}
