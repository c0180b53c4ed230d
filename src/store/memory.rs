use super::{KeyValueStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store using HashMap and Mutex
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
        let slots = self.inner.lock().await;
        Ok(slots.get(slot).cloned())
    }

    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError> {
        let mut slots = self.inner.lock().await;
        debug!("Store SET for slot: {}", slot);
        slots.insert(slot.to_string(), value);
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<(), StoreError> {
        let mut slots = self.inner.lock().await;
        slots.remove(slot);
        debug!("Store REMOVE for slot: {}", slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_get_set() {
        let store = MemoryStore::new();

        // Initially, store is empty
        assert!(store.get("slot1").await.unwrap().is_none());

        store.set("slot1", "one".to_string()).await.unwrap();
        assert_eq!(store.get("slot1").await.unwrap().as_deref(), Some("one"));

        // Overwrite keeps a single value
        store.set("slot1", "two".to_string()).await.unwrap();
        assert_eq!(store.get("slot1").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_store_remove() {
        let store = MemoryStore::new();

        store.set("slot1", "one".to_string()).await.unwrap();
        store.remove("slot1").await.unwrap();
        assert!(store.get("slot1").await.unwrap().is_none());

        // Removing a missing slot is not an error
        store.remove("slot1").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_slots() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("slot1", "one".to_string()).await.unwrap();
        assert_eq!(other.get("slot1").await.unwrap().as_deref(), Some("one"));
    }
}
