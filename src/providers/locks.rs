//! Per-key async locks.
//!
//! Check-then-act sequences on one plan are serialized while operations on
//! different plans proceed independently. Entries are created on demand and
//! removed again when the last holder or waiter lets go, so the table only
//! ever contains keys with in-flight operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = HashMap<String, LockEntry>;

#[derive(Debug, Default)]
struct LockEntry {
    mutex: Arc<AsyncMutex<()>>,
    /// Holder plus waiters, including waiters that have not been polled since
    /// the mutex was released.
    users: usize,
}

/// Table of async mutexes keyed by composed store key.
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    table: Arc<Mutex<LockTable>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The returned guard releases the key when dropped. Dropping the future
    /// before it resolves gives up the place in the queue the same way.
    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let mutex = {
            let mut table = lock_table(&self.table);
            let entry = table.entry(key.to_string()).or_default();
            entry.users += 1;
            Arc::clone(&entry.mutex)
        };

        // Registered before the await so cancellation still runs Drop.
        let mut guard = KeyGuard {
            key: key.to_string(),
            guard: None,
            table: Arc::clone(&self.table),
        };
        guard.guard = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of keys with a holder or waiters.
    pub fn active_keys(&self) -> usize {
        lock_table(&self.table).len()
    }
}

// Every update to the table is a single counter step or insert/remove, so a
// panic while it was locked cannot leave it inconsistent.
fn lock_table(table: &Mutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive access to one key.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<Mutex<LockTable>>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut table = lock_table(&self.table);
        let released = match table.get_mut(&self.key) {
            Some(entry) => {
                entry.users = entry.users.saturating_sub(1);
                entry.users == 0
            }
            None => false,
        };
        if released {
            table.remove(&self.key);
        }
    }
}
