//! Request id and bearer-token middleware.

use crate::auth::{Credential, TokenVerifier, Verifier};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Assign a request id (reusing a sane inbound `X-Request-Id`) and echo it on
/// the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    debug!("{} {} (request: '{}')", request.method(), request.uri().path(), id);
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Verify the bearer token before any plan handler runs.
///
/// On success the caller's identity is placed into request extensions.
pub async fn authenticate(
    State(verifier): State<Arc<Verifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !verifier.requires_credentials() {
        return next.run(request).await;
    }

    let parsed = {
        let header_value = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        Credential::from_authorization_header(header_value)
    };

    let credential = match parsed {
        Ok(credential) => credential,
        Err(e) => return e.into_response(),
    };

    match verifier.verify(credential).await {
        Ok(verified) => {
            let caller = verified.caller();
            debug!("Authenticated caller '{}'", caller.subject);
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
