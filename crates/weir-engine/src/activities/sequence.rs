//! Sequential composite

use async_trait::async_trait;
use serde_json::json;

use crate::activity::{
    ActivityHandler, ActivityMetadata, ActivityScope, ChildCompleted, ScheduleChildOptions,
};
use crate::error::ActivityFault;

const CURSOR: &str = "cursor";

/// Runs its children one after another
///
/// The progress cursor lives in execution-context properties, so an
/// interrupted execution replays from the first child that never
/// completed.
pub struct Sequence;

impl Sequence {
    fn cursor(scope: &ActivityScope<'_>) -> usize {
        scope
            .property(CURSOR)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize
    }
}

#[async_trait]
impl ActivityHandler for Sequence {
    fn type_name(&self) -> &'static str {
        "sequence"
    }

    fn metadata(&self) -> ActivityMetadata {
        ActivityMetadata::composite("sequence")
            .with_description("Runs child activities in order")
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let children = scope.child_node_ids();
        let cursor = Self::cursor(scope);
        if cursor >= children.len() {
            scope.complete();
            return Ok(());
        }
        scope.schedule_child(&children[cursor], ScheduleChildOptions::prepend())
    }

    async fn child_completed(
        &self,
        scope: &mut ActivityScope<'_>,
        _child: ChildCompleted,
    ) -> Result<(), ActivityFault> {
        let children = scope.child_node_ids();
        let next = Self::cursor(scope) + 1;
        scope.set_property(CURSOR, json!(next));
        if next < children.len() {
            scope.schedule_child(&children[next], ScheduleChildOptions::prepend())
        } else {
            scope.complete();
            Ok(())
        }
    }
}
