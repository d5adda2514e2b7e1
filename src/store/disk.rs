use crate::core::storage::KeyValueStorage;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "quotes";

/// Storage backed by a fjall keyspace, so cached quotes survive across sessions.
pub struct DiskStorage {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStorage {
    pub fn open(data_path: &Path) -> Result<Self> {
        let cache_dir = data_path.join("cache");
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create directory: {}", cache_dir.display()))?;

        let keyspace = fjall::Config::new(&cache_dir)
            .open()
            .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open cache partition")?;
        debug!("Opened disk storage at {}", cache_dir.display());

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl KeyValueStorage for DiskStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self.partition.get(key)? {
            Some(value) => Ok(Some(
                String::from_utf8(value.to_vec()).context("Stored value is not valid UTF-8")?,
            )),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Storage PUT for key: {}", key);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.partition.remove(key)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Storage REMOVE for key: {}", key);
        Ok(())
    }
}
