//! Key-value store abstraction for plan documents.
//!
//! The `StorageProvider` trait is deliberately dumb: opaque bytes under opaque
//! string keys, with unconditional overwrite. Existence checks, precondition
//! comparison and per-key serialization belong to the engine in
//! [`crate::providers`], not to the store.
//!
//! # Keys
//!
//! Every plan lives under `<prefix>_<objectId>`, e.g. `plan_12xvxc345ssdsds-508`.
//! There are no secondary indices.
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
//! storage.put(&key, br#"{"objectId":"p1"}"#.to_vec()).await?;
//! assert!(storage.exists(&key).await?);
//!
//! let keys = storage.list_keys(&StorageKey::prefix("plan")).await?;
//! assert_eq!(keys, vec![key.clone()]);
//!
//! assert!(storage.delete(&key).await?);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats};

use std::fmt;
use std::future::Future;

/// Composed store key: `<prefix>_<objectId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    prefix: String,
    object_id: String,
}

impl StorageKey {
    pub fn new(prefix: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            object_id: object_id.into(),
        }
    }

    pub fn prefix_str(&self) -> &str {
        &self.prefix
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Prefix for listing every key of one resource type.
    pub fn prefix(prefix: impl Into<String>) -> StoragePrefix {
        StoragePrefix {
            prefix: prefix.into(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.prefix, self.object_id)
    }
}

/// Prefix shared by all keys of one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePrefix {
    prefix: String,
}

impl StoragePrefix {
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Recover a key from its composed string form, if it falls under this
    /// prefix.
    pub fn parse_key(&self, composed: &str) -> Option<StorageKey> {
        let object_id = composed
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('_')?;
        if object_id.is_empty() {
            return None;
        }
        Some(StorageKey::new(self.prefix.clone(), object_id))
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_", self.prefix)
    }
}

/// Key-value operations the engine needs from a store.
///
/// Implementations must not add conditional behavior: `put` always overwrites,
/// `delete` always removes. Values are stored and returned byte-for-byte, since
/// versions are fingerprints of exactly those bytes.
pub trait StorageProvider: Send + Sync {
    /// Backend-specific error, convertible to the common store error.
    type Error: std::error::Error + Into<StorageError> + Send + Sync + 'static;

    /// Whether a value exists under `key`.
    fn exists(&self, key: &StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// The bytes stored under `key`, or `None`.
    fn get(
        &self,
        key: &StorageKey,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Store `value` under `key`, replacing whatever was there.
    fn put(
        &self,
        key: &StorageKey,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Remove `key`. Returns `true` if something was deleted.
    fn delete(&self, key: &StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Every key under `prefix`, in a stable order.
    fn list_keys(
        &self,
        prefix: &StoragePrefix,
    ) -> impl Future<Output = Result<Vec<StorageKey>, Self::Error>> + Send;
}
