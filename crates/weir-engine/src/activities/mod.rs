//! Built-in control-flow activities
//!
//! A minimal handler set covering the engine's structural semantics:
//! sequential and parallel composition, variable writes, bookmark-based
//! waits, faults, and early completion. Hosts register richer activity
//! libraries alongside these.

mod event;
mod fault;
mod finish;
mod parallel;
mod sequence;
mod set_variable;

use std::sync::Arc;

pub use event::Event;
pub use fault::Fault;
pub use finish::Finish;
pub use parallel::Parallel;
pub use sequence::Sequence;
pub use set_variable::SetVariable;

use crate::engine::ActivityRegistry;

/// Register every built-in handler
pub fn install(registry: &mut ActivityRegistry) {
    registry.register(Arc::new(Sequence));
    registry.register(Arc::new(Parallel));
    registry.register(Arc::new(SetVariable));
    registry.register(Arc::new(Event));
    registry.register(Arc::new(Fault));
    registry.register(Arc::new(Finish));
}

/// A registry pre-loaded with the built-in handlers
pub fn default_registry() -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    install(&mut registry);
    registry
}
