//! Plan resource service with content-derived ETags.
//!
//! Plans are stored as JSON documents in a key-value store and served over
//! HTTP with optimistic concurrency: every response carries an `ETag` that is
//! the SHA-256 fingerprint of the stored bytes, and every mutation can be made
//! conditional on it with `If-Match`. Bodies pass a structural schema gate
//! before anything is written.
//!
//! # Core Components
//!
//! - [`PlanProvider`] - the conditional operation engine
//! - [`StorageProvider`] - trait for key-value store backends
//! - [`PlanSchema`] - the schema gate
//! - [`server::build_router`] - the axum HTTP layer
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use plan_server::config::ServerConfig;
//! use plan_server::storage::InMemoryStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::builder().build()?;
//! plan_server::server::serve(config, InMemoryStorage::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod providers;
pub mod resource;
pub mod schema;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{AuthConfig, ConfigError, ServerConfig, ServerConfigBuilder};
pub use error::{PlanError, PlanResult, ValidationErrors, Violation};
pub use providers::PlanProvider;
pub use resource::{
    CreateOutcome, HttpVersion, Plan, Precondition, RawVersion, ReadOutcome, RequestContext,
    VersionedPlan,
};
pub use schema::{AcceptedPlan, PlanSchema};
pub use server::{AppState, build_router};
pub use storage::{InMemoryStorage, StorageError, StorageProvider};
