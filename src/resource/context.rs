//! Per-request context for plan operations.

use crate::auth::CallerIdentity;
use uuid::Uuid;

/// Request context for plan operations.
///
/// Carries the request id used to correlate log lines and, once the bearer
/// token has been verified, the identity of the caller.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request
    pub request_id: String,
    /// Verified caller, absent when authentication is disabled
    pub caller: Option<CallerIdentity>,
}

impl RequestContext {
    /// Create a new request context with a specific request ID.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            caller: None,
        }
    }

    /// Create a new request context with a generated request ID.
    pub fn with_generated_id() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_caller(mut self, caller: CallerIdentity) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Subject of the verified caller, or `"anonymous"`.
    pub fn caller_subject(&self) -> &str {
        self.caller
            .as_ref()
            .map(|caller| caller.subject.as_str())
            .unwrap_or("anonymous")
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}
