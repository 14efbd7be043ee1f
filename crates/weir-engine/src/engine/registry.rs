//! Activity handler registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::activity::ActivityHandler;

/// Registry mapping activity type names to handlers
///
/// Dispatch is by registered type name, never by downcasting: the graph
/// stores a `type_name` per node and the drain resolves the handler here
/// at execution time. An unregistered type surfaces as an activity fault,
/// not a panic.
#[derive(Default)]
pub struct ActivityRegistry {
    handlers: HashMap<&'static str, Arc<dyn ActivityHandler>>,
}

impl ActivityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its type name
    pub fn register(&mut self, handler: Arc<dyn ActivityHandler>) {
        self.handlers.insert(handler.type_name(), handler);
    }

    /// Resolve a handler by type name
    pub fn get(&self, type_name: &str) -> Option<Arc<dyn ActivityHandler>> {
        self.handlers.get(type_name).cloned()
    }

    /// Whether a handler is registered under the type name
    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered type names
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

impl fmt::Debug for ActivityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityRegistry")
            .field("type_names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityScope;
    use crate::error::ActivityFault;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl ActivityHandler for Noop {
        fn type_name(&self) -> &'static str {
            "noop"
        }

        async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
            scope.complete();
            Ok(())
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ActivityRegistry::new();
        registry.register(Arc::new(Noop));

        assert!(registry.contains("noop"));
        assert!(registry.get("noop").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_debug() {
        let mut registry = ActivityRegistry::new();
        registry.register(Arc::new(Noop));
        assert!(format!("{registry:?}").contains("noop"));
    }
}
