//! Early-completion activity

use async_trait::async_trait;

use crate::activity::{ActivityHandler, ActivityScope};
use crate::error::ActivityFault;

/// Completes the whole workflow immediately
///
/// Inputs: `result` (any, optional), bound to the declared result
/// variable and exposed as the `result` workflow output.
pub struct Finish;

#[async_trait]
impl ActivityHandler for Finish {
    fn type_name(&self) -> &'static str {
        "finish"
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let result = scope.input("result");
        scope.finish_workflow(result);
        Ok(())
    }
}
