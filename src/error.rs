//! Error types for plan operations.
//!
//! [`PlanError`] is the single failure type returned by the conditional
//! operation engine. Each variant maps to exactly one HTTP outcome; the mapping
//! itself lives in [`crate::server::response`].

use crate::resource::version::{VersionConflict, VersionError};
use crate::schema::GateError;
use crate::storage::StorageError;
use serde::Serialize;
use std::fmt;

/// Main error type for plan operations.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The document failed the schema gate
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The request body was not a JSON document
    #[error("Malformed request body: {message}")]
    MalformedBody { message: String },

    /// An `If-Match` or `If-None-Match` header could not be parsed
    #[error("Invalid precondition header: {0}")]
    InvalidPrecondition(#[from] VersionError),

    /// No plan is stored under the requested id
    #[error("Plan not found: {object_id}")]
    NotFound { object_id: String },

    /// A plan with this id already exists
    #[error("Plan already exists: {object_id}")]
    Conflict { object_id: String },

    /// The supplied `If-Match` did not match the stored version
    #[error("Precondition failed: {0}")]
    PreconditionFailed(VersionConflict),

    /// A mutating operation that requires `If-Match` arrived without one
    #[error("If-Match header is required to modify plan {object_id}")]
    PreconditionMissing { object_id: String },

    /// Listing found nothing under the configured prefix
    #[error("No plans found")]
    NoPlans,

    /// The key-value store failed
    #[error("Store error: {0}")]
    Store(#[from] StorageError),

    /// Unexpected internal failure
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlanError {
    pub fn not_found(object_id: impl Into<String>) -> Self {
        Self::NotFound {
            object_id: object_id.into(),
        }
    }

    pub fn conflict(object_id: impl Into<String>) -> Self {
        Self::Conflict {
            object_id: object_id.into(),
        }
    }

    pub fn precondition_missing(object_id: impl Into<String>) -> Self {
        Self::PreconditionMissing {
            object_id: object_id.into(),
        }
    }

    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used as the `type` member of error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PlanError::Validation(_) => "validation",
            PlanError::MalformedBody { .. } => "malformedBody",
            PlanError::InvalidPrecondition(_) => "invalidPrecondition",
            PlanError::NotFound { .. } => "notFound",
            PlanError::Conflict { .. } => "conflict",
            PlanError::PreconditionFailed(_) => "preconditionFailed",
            PlanError::PreconditionMissing { .. } => "preconditionRequired",
            PlanError::NoPlans => "noPlans",
            PlanError::Store(e) if e.is_unavailable() => "storeUnavailable",
            PlanError::Store(_) | PlanError::Internal { .. } => "internal",
        }
    }

}

impl From<GateError> for PlanError {
    fn from(rejection: GateError) -> Self {
        match rejection {
            GateError::Rejected(errors) => PlanError::Validation(errors),
            GateError::ModelMismatch(detail) => PlanError::internal(detail),
        }
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(error: serde_json::Error) -> Self {
        PlanError::malformed_body(error.to_string())
    }
}

/// Result type for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// One schema violation: where it happened and what is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Path into the document, e.g. `linkedPlanServices[0].linkedService.name`
    pub path: String,
    pub reason: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Every violation found in a rejected document.
///
/// Never empty when returned from the schema gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self(violations)
    }

    pub fn single(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self(vec![Violation::new(path, reason)])
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any violation is reported at exactly `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
