//! Durable named slots backing the usage counter and the rate cache.

pub mod disk;
pub mod memory;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Slot holding today's [`UsageRecord`](crate::service::usage::UsageRecord).
pub const USAGE_SLOT: &str = "apiUsageToday";
/// Slot holding the single [`CacheEntry`](crate::service::cache::CacheEntry).
pub const CACHE_SLOT: &str = "metalRatesCache";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed value in slot {slot}: {source}")]
    Malformed {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store with no cross-process locking.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, slot: &str) -> Result<(), StoreError>;
}

pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    slot: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(slot).await? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                slot: slot.to_string(),
                source,
            })?;
            Ok(Some(value))
        }
        None => {
            debug!("Slot {} is empty", slot);
            Ok(None)
        }
    }
}

pub async fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    slot: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Malformed {
        slot: slot.to_string(),
        source,
    })?;
    store.set(slot, raw).await
}
