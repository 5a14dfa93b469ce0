//! The conditional operation engine.
//!
//! * [`PlanProvider`] - create, read, replace, patch, delete and list plans
//!   over any [`crate::storage::StorageProvider`]
//! * [`KeyLocks`] - the per-key locks that serialize mutations on one plan

pub mod locks;
pub mod plan_provider;


pub use locks::{KeyGuard, KeyLocks};
pub use plan_provider::{DEFAULT_KEY_PREFIX, DEFAULT_STORE_TIMEOUT, PlanProvider};
