//! In-memory store for plan documents.
//!
//! A thread-safe `StorageProvider` over a `BTreeMap` guarded by tokio's
//! `RwLock`. Keys are held in their composed string form, the same shape a
//! remote key-value store would see, and iterate in sorted order so that
//! listings are stable.
//!
//! # Performance Characteristics
//!
//! * GET/PUT/DELETE/EXISTS: O(log n)
//! * LIST_KEYS: O(log n + k) for k matching keys
//!
//! # Example Usage
//!
//! ```rust
//! use plan_server::storage::{InMemoryStorage, StorageKey, StorageProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//! let key = StorageKey::new("plan", "p1");
//!
//! storage.put(&key, b"{}".to_vec()).await?;
//! assert_eq!(storage.get(&key).await?, Some(b"{}".to_vec()));
//!
//! let stats = storage.stats().await;
//! assert_eq!(stats.total_keys, 1);
//! # Ok(())
//! # }
//! ```

use crate::storage::{StorageError, StorageKey, StoragePrefix, StorageProvider};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory key-value store.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage statistics for debugging and monitoring.
    pub async fn stats(&self) -> InMemoryStorageStats {
        let data_guard = self.data.read().await;
        InMemoryStorageStats {
            total_keys: data_guard.len(),
            total_bytes: data_guard.values().map(Vec::len).sum(),
        }
    }

    /// Remove everything (useful for testing).
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage").finish_non_exhaustive()
    }
}

impl StorageProvider for InMemoryStorage {
    type Error = StorageError;

    async fn exists(&self, key: &StorageKey) -> Result<bool, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard.contains_key(&key.to_string()))
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard.get(&key.to_string()).cloned())
    }

    async fn put(&self, key: &StorageKey, value: Vec<u8>) -> Result<(), Self::Error> {
        let mut data_guard = self.data.write().await;
        data_guard.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, Self::Error> {
        let mut data_guard = self.data.write().await;
        Ok(data_guard.remove(&key.to_string()).is_some())
    }

    async fn list_keys(&self, prefix: &StoragePrefix) -> Result<Vec<StorageKey>, Self::Error> {
        let data_guard = self.data.read().await;
        let start = prefix.to_string();

        let keys = data_guard
            .range::<String, _>((Bound::Included(&start), Bound::Unbounded))
            .map(|(composed, _)| composed)
            .take_while(|composed| composed.starts_with(start.as_str()))
            .filter_map(|composed| prefix.parse_key(composed))
            .collect();

        Ok(keys)
    }
}

/// Statistics about the current state of the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    /// Number of stored keys
    pub total_keys: usize,
    /// Sum of stored value sizes
    pub total_bytes: usize,
}
