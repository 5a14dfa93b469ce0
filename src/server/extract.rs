//! Request extraction helpers: precondition headers and the per-request
//! context.

use super::middleware::RequestId;
use crate::auth::CallerIdentity;
use crate::error::PlanError;
use crate::resource::{Precondition, RequestContext, VersionError};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderName, header, request::Parts};
use serde_json::Value;
use std::convert::Infallible;

/// Parse `If-Match` / `If-None-Match`.
///
/// Repeated header lines are combined into one list, as HTTP allows. Weak
/// tags are dropped from `If-Match`, which compares strongly.
pub fn precondition(
    headers: &HeaderMap,
    name: &HeaderName,
) -> Result<Option<Precondition>, PlanError> {
    let mut combined = Vec::new();
    for value in headers.get_all(name) {
        let value = value
            .to_str()
            .map_err(|_| VersionError::InvalidEtagFormat(format!("non-ASCII {} header", name)))?;
        combined.push(value);
    }

    if combined.is_empty() {
        return Ok(None);
    }

    let joined = combined.join(", ");
    let condition = if *name == header::IF_MATCH {
        Precondition::parse_if_match(&joined)?
    } else {
        joined.parse()?
    };
    Ok(Some(condition))
}

/// Parse a request body as JSON.
pub fn json_body(body: &[u8]) -> Result<Value, PlanError> {
    Ok(serde_json::from_slice(body)?)
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = match parts.extensions.get::<RequestId>() {
            Some(id) => RequestContext::new(id.as_str()),
            None => RequestContext::with_generated_id(),
        };

        Ok(match parts.extensions.get::<CallerIdentity>() {
            Some(caller) => context.with_caller(caller.clone()),
            None => context,
        })
    }
}
