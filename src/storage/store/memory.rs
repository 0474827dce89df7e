//! An in-memory store.

use parking_lot::RwLock;

use crate::storage::{
    AsyncListableStorageTraits, AsyncReadableStorageTraits, AsyncWritableStorageTraits, Bytes,
    MaybeBytes, StorageError, StoreKey, StoreKeys, StorePrefix,
};

use std::collections::BTreeMap;

/// An in-memory store.
///
/// Readable, writable and listable. Intended for testing and for staging
/// hierarchies before copying them to persistent storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: RwLock<BTreeMap<StoreKey, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of keys in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data_map.read().len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_map.read().is_empty()
    }
}

#[async_trait::async_trait]
impl AsyncReadableStorageTraits for MemoryStore {
    async fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.data_map.read().get(key).cloned())
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.data_map.read().contains_key(key))
    }

    async fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.data_map.read().get(key).map(|v| v.len() as u64))
    }
}

#[async_trait::async_trait]
impl AsyncWritableStorageTraits for MemoryStore {
    async fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.data_map.write().insert(key.clone(), value);
        Ok(())
    }

    async fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.data_map.write().remove(key);
        Ok(())
    }
}

#[async_trait::async_trait]
impl AsyncListableStorageTraits for MemoryStore {
    async fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self
            .data_map
            .read()
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        let key = StoreKey::new("a/b")?;
        assert_eq!(store.get(&key).await?, None);
        store.set(&key, vec![0u8, 1, 2].into()).await?;
        assert!(store.exists(&key).await?);
        assert_eq!(store.size_key(&key).await?, Some(3));
        assert_eq!(store.get(&key).await?, Some(vec![0u8, 1, 2].into()));
        store.set(&StoreKey::new("a/c")?, vec![3u8].into()).await?;
        store.set(&StoreKey::new("b")?, vec![4u8].into()).await?;
        let keys = store.list_prefix(&StorePrefix::new("a/")?).await?;
        assert_eq!(keys.len(), 2);
        store.erase(&key).await?;
        assert!(!store.exists(&key).await?);
        Ok(())
    }
}
