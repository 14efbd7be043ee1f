//! Memory register

use std::collections::HashMap;

use serde_json::Value;

use super::{BlockId, BlockKind, MemoryBlock, Variable, VariableScope};

/// A mapping from block id to memory block
///
/// Registers hold only their own bindings; the parent walk happens at the
/// workflow execution context level against the flat activity table, so
/// registers stay cycle-free and trivially serializable.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegister {
    blocks: HashMap<BlockId, MemoryBlock>,
}

impl MemoryRegister {
    /// Create an empty register
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable, binding its default value
    ///
    /// Re-declaring an existing block keeps the current value; declarations
    /// are idempotent across re-entrant executions.
    pub fn declare(&mut self, variable: &Variable) {
        if self.blocks.contains_key(&variable.id) {
            return;
        }
        let mut block = MemoryBlock::declared(variable.default_value.clone(), variable.scope);
        if let Some(driver) = &variable.storage_driver {
            block = block.with_driver(driver.clone());
        }
        self.blocks.insert(variable.id.clone(), block);
    }

    /// Look up a block
    pub fn block(&self, id: &BlockId) -> Option<&MemoryBlock> {
        self.blocks.get(id)
    }

    /// Whether the register binds the block
    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Local value lookup; does not walk parents
    pub fn get(&self, id: &BlockId) -> Option<&Value> {
        self.blocks.get(id).map(|b| &b.value)
    }

    /// Set the value of an existing block
    ///
    /// Returns `false` when the block is not bound here.
    pub fn set(&mut self, id: &BlockId, value: Value) -> bool {
        match self.blocks.get_mut(id) {
            Some(block) => {
                block.value = value;
                true
            }
            None => false,
        }
    }

    /// Bind a dynamic block, overwriting any existing binding
    pub fn bind_dynamic(&mut self, id: BlockId, value: Value) {
        match self.blocks.get_mut(&id) {
            Some(block) => block.value = value,
            None => {
                self.blocks.insert(id, MemoryBlock::dynamic(value));
            }
        }
    }

    /// Insert a fully-formed block (state rehydration)
    pub fn insert(&mut self, id: BlockId, block: MemoryBlock) {
        self.blocks.insert(id, block);
    }

    /// Iterate all bindings
    pub fn iter(&self) -> impl Iterator<Item = (&BlockId, &MemoryBlock)> {
        self.blocks.iter()
    }

    /// Iterate bindings that survive persistence
    pub fn iter_persistent(&self) -> impl Iterator<Item = (&BlockId, &MemoryBlock)> {
        self.blocks
            .iter()
            .filter(|(_, b)| b.scope != VariableScope::Transient)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the register has no bindings
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether the block is declared (as opposed to dynamic) here
    pub fn declares(&self, id: &BlockId) -> bool {
        self.blocks
            .get(id)
            .map(|b| b.kind == BlockKind::Declared)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declare_binds_default() {
        let mut register = MemoryRegister::new();
        register.declare(&Variable::new("x").with_default(json!(1)));

        assert_eq!(register.get(&"x".into()), Some(&json!(1)));
        assert!(register.declares(&"x".into()));
    }

    #[test]
    fn test_redeclare_keeps_value() {
        let mut register = MemoryRegister::new();
        let var = Variable::new("x").with_default(json!(1));
        register.declare(&var);
        register.set(&"x".into(), json!(42));
        register.declare(&var);

        assert_eq!(register.get(&"x".into()), Some(&json!(42)));
    }

    #[test]
    fn test_set_unknown_block_fails() {
        let mut register = MemoryRegister::new();
        assert!(!register.set(&"missing".into(), json!(1)));
    }

    #[test]
    fn test_dynamic_binding() {
        let mut register = MemoryRegister::new();
        register.bind_dynamic("evt".into(), json!({"k": "v"}));

        assert!(!register.declares(&"evt".into()));
        assert_eq!(register.get(&"evt".into()), Some(&json!({"k": "v"})));
    }

    #[test]
    fn test_transient_blocks_not_persistent() {
        let mut register = MemoryRegister::new();
        register.declare(&Variable::new("tmp").with_scope(VariableScope::Transient));
        register.declare(&Variable::new("kept"));

        let persistent: Vec<_> = register.iter_persistent().collect();
        assert_eq!(persistent.len(), 1);
        assert_eq!(persistent[0].0.as_str(), "kept");
    }
}
