//! Stored plans paired with their derived versions, and operation outcomes.
//!
//! # Core Types
//!
//! * [`VersionedPlan`] - stored bytes plus the fingerprint computed from them
//! * [`CreateOutcome`] / [`ReadOutcome`] - success variants of operations that
//!   can legitimately end in "not modified"
//!
//! Failure variants live in [`crate::error::PlanError`].
//!
//! ```rust
//! use plan_server::resource::versioned::VersionedPlan;
//! use plan_server::resource::version::RawVersion;
//!
//! let stored = br#"{"objectId":"p1"}"#.to_vec();
//! let versioned = VersionedPlan::from_stored("p1", stored.clone());
//! assert_eq!(versioned.version(), &RawVersion::from_content(&stored));
//! ```

use super::version::{HttpVersion, RawVersion};
use serde_json::Value;

/// A plan exactly as stored, with the version derived from those bytes.
///
/// There is no constructor that accepts a version: the only way to obtain one
/// is to fingerprint the content.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedPlan {
    object_id: String,
    content: Vec<u8>,
    version: RawVersion,
}

impl VersionedPlan {
    /// Wrap stored bytes, computing their fingerprint.
    pub fn from_stored(object_id: impl Into<String>, content: Vec<u8>) -> Self {
        let version = RawVersion::from_content(&content);
        Self {
            object_id: object_id.into(),
            content,
            version,
        }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// The stored bytes, unchanged.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn version(&self) -> &RawVersion {
        &self.version
    }

    /// The version in entity-tag form, ready for an `ETag` header.
    pub fn etag(&self) -> HttpVersion {
        HttpVersion::from(self.version.clone())
    }

    /// Parse the stored bytes as JSON.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.content)
    }
}

/// Successful results of a create.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// A new plan was stored
    Created(VersionedPlan),

    /// The plan already exists and the caller proved it holds the current
    /// version via `If-None-Match`; nothing was written
    NotModified,
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }

    pub fn into_created(self) -> Option<VersionedPlan> {
        match self {
            CreateOutcome::Created(plan) => Some(plan),
            CreateOutcome::NotModified => None,
        }
    }
}

/// Successful results of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The stored plan and its version
    Found(VersionedPlan),

    /// The caller's `If-None-Match` matched; only the version is returned
    NotModified(RawVersion),
}

impl ReadOutcome {
    pub fn version(&self) -> &RawVersion {
        match self {
            ReadOutcome::Found(plan) => plan.version(),
            ReadOutcome::NotModified(version) => version,
        }
    }

    pub fn into_found(self) -> Option<VersionedPlan> {
        match self {
            ReadOutcome::Found(plan) => Some(plan),
            ReadOutcome::NotModified(_) => None,
        }
    }
}
