//! Mapping of engine outcomes and errors onto HTTP responses.
//!
//! | Error | Status |
//! |---|---|
//! | validation, malformed body, bad precondition header | 400 |
//! | missing or rejected bearer token | 401 |
//! | plan not found, empty listing | 404 |
//! | plan already exists | 409 |
//! | `If-Match` mismatch | 412, with the current `ETag` |
//! | `If-Match` missing | 428 |
//! | store timeout or outage | 503 |
//! | anything else | 500, without internal detail |

use crate::auth::AuthError;
use crate::error::PlanError;
use crate::resource::HttpVersion;
use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde_json::{Value, json};

impl PlanError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PlanError::Validation(_)
            | PlanError::MalformedBody { .. }
            | PlanError::InvalidPrecondition(_) => StatusCode::BAD_REQUEST,
            PlanError::NotFound { .. } | PlanError::NoPlans => StatusCode::NOT_FOUND,
            PlanError::Conflict { .. } => StatusCode::CONFLICT,
            PlanError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            PlanError::PreconditionMissing { .. } => StatusCode::PRECONDITION_REQUIRED,
            PlanError::Store(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            PlanError::Store(_) | PlanError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        let kind = self.kind();
        match self {
            PlanError::Validation(errors) => json!({
                "message": "Validation error",
                "type": kind,
                "violations": errors,
            }),
            PlanError::MalformedBody { message } => json!({
                "message": "Request body is not valid JSON",
                "type": kind,
                "detail": message,
            }),
            PlanError::InvalidPrecondition(e) => json!({
                "message": e.to_string(),
                "type": kind,
            }),
            PlanError::NotFound { object_id } => json!({
                "message": "Plan not found",
                "type": kind,
                "objectId": object_id,
            }),
            PlanError::Conflict { object_id } => json!({
                "message": "Conflict - Plan already exists",
                "type": kind,
                "objectId": object_id,
            }),
            PlanError::PreconditionFailed(conflict) => json!({
                "message": conflict.message,
                "type": kind,
                "currentETag": HttpVersion::from(conflict.current.clone()).to_string(),
            }),
            PlanError::PreconditionMissing { object_id } => json!({
                "message": "If-Match header is required",
                "type": kind,
                "objectId": object_id,
            }),
            PlanError::NoPlans => json!({
                "message": "Plans not found",
                "type": kind,
            }),
            PlanError::Store(e) if e.is_unavailable() => json!({
                "message": "Store unavailable",
                "type": kind,
            }),
            PlanError::Store(_) | PlanError::Internal { .. } => json!({
                "message": "Internal server error",
                "type": kind,
            }),
        }
    }
}

impl IntoResponse for PlanError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self);
        }

        let mut headers = HeaderMap::new();
        if let PlanError::PreconditionFailed(conflict) = &self {
            insert_etag(&mut headers, &HttpVersion::from(conflict.current.clone()));
        }

        (status, headers, Json(self.body())).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        warn!("Unauthorized request: {}", self);
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
            Json(json!({
                "message": format!("Unauthorized - {}", self),
                "type": "unauthorized",
            })),
        )
            .into_response()
    }
}

/// Set the `ETag` header. Issued tags are always valid header values.
pub(crate) fn insert_etag(headers: &mut HeaderMap, etag: &HttpVersion) {
    if let Ok(value) = HeaderValue::from_str(&etag.to_string()) {
        headers.insert(header::ETAG, value);
    }
}

/// A stored plan sent back verbatim with its `ETag`.
pub(crate) fn stored_plan(status: StatusCode, etag: &HttpVersion, content: Vec<u8>) -> Response {
    let mut headers = HeaderMap::new();
    insert_etag(&mut headers, etag);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    (status, headers, content).into_response()
}
