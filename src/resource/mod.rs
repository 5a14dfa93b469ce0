//! Plan resource types.
//!
//! - [`plan`] - typed plan documents
//! - [`version`] - content fingerprints and entity-tag preconditions
//! - [`versioned`] - stored plans with derived versions, operation outcomes
//! - [`merge`] - merge semantics for partial updates
//! - [`context`] - per-request context

pub mod context;
pub mod merge;
pub mod plan;
pub mod version;
pub mod versioned;

pub use context::RequestContext;
pub use plan::{CostShares, LinkedPlanService, LinkedService, Plan};
pub use version::{HttpVersion, Precondition, RawVersion, VersionConflict, VersionError};
pub use versioned::{CreateOutcome, ReadOutcome, VersionedPlan};
