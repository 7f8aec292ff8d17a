use std::collections::HashMap;

use serde_json::Value;

use super::{KeyedStore, StoreError};

/// In-process store. Nothing survives the process; used by tests and
/// throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyedStore for MemoryStore {
    fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.slots.extend(entries);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.slots.keys().cloned().collect())
    }
}
