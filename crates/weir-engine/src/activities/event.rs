//! Bookmark-based wait activity

use async_trait::async_trait;
use serde_json::Value;

use crate::activity::{ActivityHandler, ActivityScope, Resumption};
use crate::error::ActivityFault;
use crate::workflow::BookmarkOptions;

/// Suspends until an external event resumes its bookmark
///
/// Inputs: `event_name` (string, required). The resumption input is
/// exposed as the `payload` output.
pub struct Event;

#[async_trait]
impl ActivityHandler for Event {
    fn type_name(&self) -> &'static str {
        "event"
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let name = scope.input_string("event_name").ok_or_else(|| {
            ActivityFault::new("event requires an `event_name` input").with_kind("bad_input")
        })?;
        // Re-execution after an interrupted turn must not double-arm
        let already_armed = scope.bookmarks().iter().any(|b| b.name == name);
        if !already_armed {
            scope.create_bookmark(name, BookmarkOptions::default().auto_complete());
        }
        Ok(())
    }

    async fn resume(
        &self,
        scope: &mut ActivityScope<'_>,
        resumption: Resumption,
    ) -> Result<(), ActivityFault> {
        match resumption.bookmark {
            Some(_) => {
                if let Some(input) = resumption.input {
                    scope.set_output("payload", Value::Object(input));
                }
                scope.complete();
                Ok(())
            }
            // Rescheduled without a bookmark: the wait never registered,
            // re-arm it
            None => self.execute(scope).await,
        }
    }
}
