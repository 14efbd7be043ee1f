//! Storage drivers for externally-held variable values

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::BlockId;

/// Errors from storage driver operations
#[derive(Debug, thiserror::Error)]
pub enum StorageDriverError {
    /// No driver registered under the requested name
    #[error("unknown storage driver: {0}")]
    UnknownDriver(String),

    /// Backend failure
    #[error("storage driver error: {0}")]
    Backend(String),
}

/// External key-value store for variable values
///
/// A variable annotated with a storage driver name keeps only metadata in
/// its register; reads and writes delegate here, keyed by
/// `(workflow_instance_id, block_id)`. The engine does not implement
/// production drivers; hosts register them by name.
#[async_trait]
pub trait VariableStorageDriver: Send + Sync {
    /// Read the value for a block, if present
    async fn read(
        &self,
        instance_id: Uuid,
        block_id: &BlockId,
    ) -> Result<Option<Value>, StorageDriverError>;

    /// Write the value for a block
    async fn write(
        &self,
        instance_id: Uuid,
        block_id: &BlockId,
        value: Value,
    ) -> Result<(), StorageDriverError>;
}

/// Named registry of storage drivers
#[derive(Default)]
pub struct StorageDriverRegistry {
    drivers: HashMap<String, Arc<dyn VariableStorageDriver>>,
}

impl StorageDriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under a name
    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn VariableStorageDriver>) {
        self.drivers.insert(name.into(), driver);
    }

    /// Resolve a driver by name
    pub fn get(&self, name: &str) -> Result<&Arc<dyn VariableStorageDriver>, StorageDriverError> {
        self.drivers
            .get(name)
            .ok_or_else(|| StorageDriverError::UnknownDriver(name.to_string()))
    }

    /// Whether a driver is registered under the name
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }
}

impl std::fmt::Debug for StorageDriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageDriverRegistry")
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// In-memory driver for tests
#[derive(Debug, Default)]
pub struct InMemoryStorageDriver {
    values: RwLock<HashMap<(Uuid, BlockId), Value>>,
}

impl InMemoryStorageDriver {
    /// Create an empty driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the driver holds no values
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl VariableStorageDriver for InMemoryStorageDriver {
    async fn read(
        &self,
        instance_id: Uuid,
        block_id: &BlockId,
    ) -> Result<Option<Value>, StorageDriverError> {
        Ok(self
            .values
            .read()
            .get(&(instance_id, block_id.clone()))
            .cloned())
    }

    async fn write(
        &self,
        instance_id: Uuid,
        block_id: &BlockId,
        value: Value,
    ) -> Result<(), StorageDriverError> {
        self.values
            .write()
            .insert((instance_id, block_id.clone()), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_driver_round_trip() {
        let driver = InMemoryStorageDriver::new();
        let instance_id = Uuid::now_v7();
        let block_id: BlockId = "large_payload".into();

        driver
            .write(instance_id, &block_id, json!({"size": 1024}))
            .await
            .expect("should write");

        let value = driver
            .read(instance_id, &block_id)
            .await
            .expect("should read");
        assert_eq!(value, Some(json!({"size": 1024})));
    }

    #[tokio::test]
    async fn test_registry_resolution() {
        let mut registry = StorageDriverRegistry::new();
        registry.register("blob", Arc::new(InMemoryStorageDriver::new()));

        assert!(registry.contains("blob"));
        assert!(registry.get("blob").is_ok());
        assert!(matches!(
            registry.get("missing"),
            Err(StorageDriverError::UnknownDriver(_))
        ));
    }
}
