use super::{KeyValueStore, StoreError};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const PARTITION: &str = "slots";

/// Slots persisted in a fjall keyspace under the data directory.
pub struct DiskStore {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(data_path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_path)?;

        let keyspace = Config::new(data_path.join("store")).open()?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened slot store at {}", data_path.display());
        Ok(Self {
            keyspace: Arc::new(keyspace),
            partition,
        })
    }
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
        match self.partition.get(slot)? {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    StoreError::Unavailable(format!("slot {slot} is not UTF-8: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError> {
        self.partition.insert(slot, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store SET for slot: {}", slot);
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<(), StoreError> {
        self.partition.remove(slot)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store REMOVE for slot: {}", slot);
        Ok(())
    }
}
