//! Plan route handlers.
//!
//! Each handler extracts identifier, body and precondition headers, calls the
//! engine once, and turns the outcome into a response. No protocol decision
//! is made here.
//!
//! Malformed headers and bodies are rejected before the engine runs, so a
//! 400 for an unparseable body takes precedence over 404 and 428.

use super::AppState;
use super::extract::{json_body, precondition};
use super::response::{insert_etag, stored_plan};
use crate::error::PlanError;
use crate::resource::{CreateOutcome, HttpVersion, ReadOutcome, RequestContext};
use crate::storage::StorageProvider;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub async fn create_plan<S: StorageProvider + 'static>(
    State(state): State<AppState<S>>,
    context: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, PlanError> {
    let if_none_match = precondition(&headers, &header::IF_NONE_MATCH)?;
    let document = json_body(&body)?;

    match state
        .provider
        .create(document, if_none_match.as_ref(), &context)
        .await?
    {
        CreateOutcome::Created(plan) => {
            let mut response_headers = HeaderMap::new();
            insert_etag(&mut response_headers, &plan.etag());
            if let Ok(location) = HeaderValue::from_str(&format!("/v1/plans/{}", plan.object_id()))
            {
                response_headers.insert(header::LOCATION, location);
            }

            Ok((
                StatusCode::CREATED,
                response_headers,
                Json(json!({
                    "message": "Plan created",
                    "objectId": plan.object_id(),
                })),
            )
                .into_response())
        }
        CreateOutcome::NotModified => Ok(StatusCode::NOT_MODIFIED.into_response()),
    }
}

pub async fn get_plan<S: StorageProvider + 'static>(
    State(state): State<AppState<S>>,
    Path(object_id): Path<String>,
    context: RequestContext,
    headers: HeaderMap,
) -> Result<Response, PlanError> {
    let if_none_match = precondition(&headers, &header::IF_NONE_MATCH)?;

    match state
        .provider
        .read(&object_id, if_none_match.as_ref(), &context)
        .await?
    {
        ReadOutcome::Found(plan) => {
            let etag = plan.etag();
            Ok(stored_plan(StatusCode::OK, &etag, plan.into_content()))
        }
        ReadOutcome::NotModified(version) => {
            let mut response_headers = HeaderMap::new();
            insert_etag(&mut response_headers, &HttpVersion::from(version));
            Ok((StatusCode::NOT_MODIFIED, response_headers).into_response())
        }
    }
}

pub async fn list_plans<S: StorageProvider + 'static>(
    State(state): State<AppState<S>>,
    context: RequestContext,
) -> Result<Response, PlanError> {
    let plans = state.provider.list(&context).await?;
    Ok(Json(plans).into_response())
}

pub async fn replace_plan<S: StorageProvider + 'static>(
    State(state): State<AppState<S>>,
    Path(object_id): Path<String>,
    context: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, PlanError> {
    let if_match = precondition(&headers, &header::IF_MATCH)?;
    let document = json_body(&body)?;

    let plan = state
        .provider
        .replace(&object_id, document, if_match.as_ref(), &context)
        .await?;

    let etag = plan.etag();
    Ok(stored_plan(StatusCode::OK, &etag, plan.into_content()))
}

pub async fn patch_plan<S: StorageProvider + 'static>(
    State(state): State<AppState<S>>,
    Path(object_id): Path<String>,
    context: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, PlanError> {
    let if_match = precondition(&headers, &header::IF_MATCH)?;
    let partial = json_body(&body)?;

    let plan = state
        .provider
        .patch(&object_id, partial, if_match.as_ref(), &context)
        .await?;

    let etag = plan.etag();
    Ok(stored_plan(StatusCode::OK, &etag, plan.into_content()))
}

pub async fn delete_plan<S: StorageProvider + 'static>(
    State(state): State<AppState<S>>,
    Path(object_id): Path<String>,
    context: RequestContext,
    headers: HeaderMap,
) -> Result<StatusCode, PlanError> {
    let if_match = precondition(&headers, &header::IF_MATCH)?;

    state
        .provider
        .delete(&object_id, if_match.as_ref(), &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
