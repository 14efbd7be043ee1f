//! Identifier generation

use uuid::Uuid;

/// Source of identifiers for execution contexts, bookmarks, and incidents
///
/// The engine never calls `Uuid::now_v7()` directly; hosts inject a
/// generator so tests and external coordinators can control id assignment.
pub trait IdentityGenerator: Send + Sync {
    /// Produce the next unique identifier
    fn next_id(&self) -> Uuid;
}

/// Default generator backed by time-ordered UUIDs
#[derive(Debug, Clone, Default)]
pub struct UuidIdentityGenerator;

impl IdentityGenerator for UuidIdentityGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}
