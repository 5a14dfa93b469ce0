//! Store backends that misbehave on purpose.

use plan_server::storage::{
    InMemoryStorage, StorageError, StorageKey, StoragePrefix, StorageProvider,
};
use std::time::Duration;

/// Refuses every call.
#[derive(Debug, Clone, Default)]
pub struct FailingStorage;

impl StorageProvider for FailingStorage {
    type Error = StorageError;

    async fn exists(&self, _key: &StorageKey) -> Result<bool, Self::Error> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn get(&self, _key: &StorageKey) -> Result<Option<Vec<u8>>, Self::Error> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn put(&self, _key: &StorageKey, _value: Vec<u8>) -> Result<(), Self::Error> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &StorageKey) -> Result<bool, Self::Error> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn list_keys(&self, _prefix: &StoragePrefix) -> Result<Vec<StorageKey>, Self::Error> {
        Err(StorageError::unavailable("connection refused"))
    }
}

/// Delays every call before handing it to an in-memory store.
#[derive(Debug, Clone)]
pub struct SlowStorage {
    inner: InMemoryStorage,
    delay: Duration,
}

impl SlowStorage {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStorage::new(),
            delay,
        }
    }

    pub fn inner(&self) -> &InMemoryStorage {
        &self.inner
    }
}

impl StorageProvider for SlowStorage {
    type Error = StorageError;

    async fn exists(&self, key: &StorageKey) -> Result<bool, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.exists(key).await
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn put(&self, key: &StorageKey, value: Vec<u8>) -> Result<(), Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(key).await
    }

    async fn list_keys(&self, prefix: &StoragePrefix) -> Result<Vec<StorageKey>, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_keys(prefix).await
    }
}
