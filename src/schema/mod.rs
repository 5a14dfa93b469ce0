//! Schema definition and validation for plan documents.
//!
//! # Key Types
//!
//! - [`PlanSchema`] - the schema gate; validates candidate documents
//! - [`AcceptedPlan`] - a validated plan together with the bytes to persist
//! - [`AttributeDefinition`] - individual attribute specifications
//!
//! # Examples
//!
//! ```rust
//! use plan_server::schema::PlanSchema;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = PlanSchema::new()?;
//! let rejection = schema.validate(&json!({"objectId": 7})).unwrap_err();
//! let errors = rejection.violations().ok_or("expected violations")?;
//! assert!(errors.has_path("objectId"));
//! assert!(errors.has_path("planCostShares"));
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod types;
pub mod validation;


pub use types::{AttributeDefinition, AttributeType, Schema};
pub use validation::{AcceptedPlan, GateError, PlanSchema};
