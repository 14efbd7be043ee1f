//! Variable write activity

use async_trait::async_trait;
use serde_json::Value;

use crate::activity::{ActivityHandler, ActivityScope};
use crate::error::ActivityFault;

/// Writes a value to a variable
///
/// Inputs: `name` (string, required), `value` (any, defaults to null).
pub struct SetVariable;

#[async_trait]
impl ActivityHandler for SetVariable {
    fn type_name(&self) -> &'static str {
        "set_variable"
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let name = scope.input_string("name").ok_or_else(|| {
            ActivityFault::new("set_variable requires a `name` input").with_kind("bad_input")
        })?;
        let value = scope.input("value").unwrap_or(Value::Null);
        scope.set_variable(&name, value).await
    }
}
