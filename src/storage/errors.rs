//! Store-level error types.
//!
//! These describe failures of the key-value backend itself. They know nothing
//! about plans, preconditions or HTTP; the engine wraps them into
//! [`crate::error::PlanError::Store`].

use std::fmt;
use std::time::Duration;

/// Errors that can occur during store operations.
///
/// Every variant is fatal for the request that hit it. Nothing in this crate
/// retries a failed store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend is not reachable or refused the operation.
    Unavailable { message: String },

    /// The operation did not complete within the configured deadline.
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Stored bytes could not be interpreted.
    DataCorruption { key: String, details: String },

    /// Backend failure that is neither an outage nor bad data.
    Internal { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable { message } => {
                write!(f, "Storage unavailable: {}", message)
            }
            StorageError::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout during {} after {:?}", operation, duration)
            }
            StorageError::DataCorruption { key, details } => {
                write!(f, "Data corruption in {}: {}", key, details)
            }
            StorageError::Internal { message } => {
                write!(f, "Internal storage error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn data_corruption(key: impl Into<String>, details: impl Into<String>) -> Self {
        Self::DataCorruption {
            key: key.into(),
            details: details.into(),
        }
    }

    /// Catch-all for backend implementations.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the backend itself is unreachable or slow, as opposed to a
    /// logic or data problem. Used to pick 503 over 500.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable { .. } | StorageError::Timeout { .. }
        )
    }
}
