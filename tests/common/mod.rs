//! Common test utilities for plan server testing.

pub mod fixtures;
pub mod server;
pub mod storage;

use plan_server::providers::PlanProvider;
use plan_server::resource::RequestContext;
use plan_server::schema::PlanSchema;
use plan_server::storage::{InMemoryStorage, StorageProvider};

/// Engine over a fresh in-memory store with default settings.
pub fn in_memory_provider() -> PlanProvider<InMemoryStorage> {
    provider_with(InMemoryStorage::new())
}

/// Engine over the given store with default settings.
pub fn provider_with<S: StorageProvider>(storage: S) -> PlanProvider<S> {
    let schema = PlanSchema::new().expect("embedded plan schema must load");
    PlanProvider::new(storage, schema)
}

pub fn context(label: &str) -> RequestContext {
    RequestContext::new(format!("test-{}", label))
}
