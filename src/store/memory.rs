use crate::core::storage::KeyValueStorage;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory storage using a HashMap behind a RwLock. Lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))?;
        debug!("Storage PUT for key: {}", key);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))?;
        items.remove(key);
        debug!("Storage REMOVE for key: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_get_set() {
        let storage = MemoryStorage::new();

        // Initially, storage is empty
        assert!(storage.get_item("key1").unwrap().is_none());

        storage.set_item("key1", "value1").unwrap();
        assert_eq!(storage.get_item("key1").unwrap().as_deref(), Some("value1"));

        // Overwrite keeps the latest value
        storage.set_item("key1", "value2").unwrap();
        assert_eq!(storage.get_item("key1").unwrap().as_deref(), Some("value2"));

        assert!(storage.get_item("key2").unwrap().is_none());
    }

    #[test]
    fn test_storage_remove() {
        let storage = MemoryStorage::new();

        storage.set_item("key1", "value1").unwrap();
        storage.remove_item("key1").unwrap();
        assert!(storage.get_item("key1").unwrap().is_none());

        // Removing a missing key is not an error
        storage.remove_item("key1").unwrap();
    }
}
