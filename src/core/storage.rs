//! Synchronous string key-value storage used to persist the quote cache

use anyhow::Result;

/// Backing storage for the quote cache.
///
/// Every operation may fail (capacity, permissions, corruption); callers decide
/// whether a failure matters.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}
