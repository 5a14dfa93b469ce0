//! Conditional operation engine for plans.
//!
//! [`PlanProvider`] owns every decision of the optimistic-concurrency
//! protocol: existence checks, fingerprint comparison against `If-Match` /
//! `If-None-Match`, the schema gate, and the store mutation. The store it is
//! given only needs to get, put, delete and list bytes.
//!
//! # Guarantees
//!
//! * Mutations on one plan are serialized through a per-key lock held across
//!   the read-compare-write sequence; plans with different ids never contend.
//! * A rejected body or failed precondition never writes anything.
//! * Every store call is bounded by the configured timeout; store failures end
//!   the request and are never retried.
//!
//! # Example Usage
//!
//! ```rust
//! use plan_server::providers::PlanProvider;
//! use plan_server::resource::{Precondition, RequestContext};
//! use plan_server::schema::PlanSchema;
//! use plan_server::storage::InMemoryStorage;
//! use serde_json::json;
//!
//! # async fn example(plan: serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
//! let provider = PlanProvider::new(InMemoryStorage::new(), PlanSchema::new()?);
//! let context = RequestContext::with_generated_id();
//!
//! let created = provider
//!     .create(plan.clone(), None, &context)
//!     .await?
//!     .into_created()
//!     .ok_or("plan already existed")?;
//!
//! let mut changed = plan;
//! changed["planType"] = json!("outOfNetwork");
//! let replaced = provider
//!     .replace(
//!         created.object_id(),
//!         changed,
//!         Some(&Precondition::exact(created.version().clone())),
//!         &context,
//!     )
//!     .await?;
//! assert_ne!(replaced.version(), created.version());
//! # Ok(())
//! # }
//! ```

use super::locks::KeyLocks;
use crate::error::{PlanError, PlanResult, ValidationErrors};
use crate::resource::{
    RequestContext,
    merge::merge_patch,
    version::{HttpVersion, Precondition, RawVersion, VersionConflict},
    versioned::{CreateOutcome, ReadOutcome, VersionedPlan},
};
use crate::schema::{AcceptedPlan, GateError, PlanSchema};
use crate::storage::{StorageError, StorageKey, StorageProvider};
use log::{debug, error, info, trace, warn};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Default key prefix, giving keys like `plan_12xvxc345ssdsds-508`.
pub const DEFAULT_KEY_PREFIX: &str = "plan";

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// The plan engine over a pluggable store.
#[derive(Debug)]
pub struct PlanProvider<S: StorageProvider> {
    storage: S,
    schema: PlanSchema,
    key_prefix: String,
    store_timeout: Duration,
    locks: KeyLocks,
}

impl<S: StorageProvider> PlanProvider<S> {
    /// Create an engine with the default key prefix and store timeout.
    pub fn new(storage: S, schema: PlanSchema) -> Self {
        Self {
            storage,
            schema,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            locks: KeyLocks::new(),
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn schema(&self) -> &PlanSchema {
        &self.schema
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    fn key_for(&self, object_id: &str) -> StorageKey {
        StorageKey::new(&self.key_prefix, object_id)
    }

    /// Create a plan.
    ///
    /// An existing plan is left untouched: when `if_none_match` lists its
    /// current ETag the outcome is [`CreateOutcome::NotModified`], otherwise
    /// (including `If-None-Match: *`) [`PlanError::Conflict`].
    pub async fn create(
        &self,
        body: Value,
        if_none_match: Option<&Precondition>,
        context: &RequestContext,
    ) -> PlanResult<CreateOutcome> {
        info!(
            "Creating plan (request: '{}', caller: '{}')",
            context.request_id,
            context.caller_subject()
        );
        trace!("Create data: {}", body);

        let accepted = self.gate(&body, None, context)?;
        let object_id = accepted.object_id().to_string();
        let key = self.key_for(&object_id);

        let _guard = self.locks.acquire(&key.to_string()).await;
        debug!("Acquired lock on {} (request: '{}')", key, context.request_id);

        if let Some(current) = self.current_version(&key).await? {
            // Only a tag the caller actually holds makes this a repeat; `*`
            // asks for "create if absent" and gets a conflict here.
            if if_none_match.is_some_and(|condition| condition.names(&current)) {
                debug!(
                    "Plan '{}' already exists at the client's version, nothing to do (request: '{}')",
                    object_id, context.request_id
                );
                return Ok(CreateOutcome::NotModified);
            }

            warn!(
                "Refusing to create plan '{}': it already exists (request: '{}')",
                object_id, context.request_id
            );
            return Err(PlanError::conflict(object_id));
        }

        let (plan, content) = accepted.into_parts();
        self.store_call("put", &key, self.storage.put(&key, content.clone()))
            .await?;

        let created = VersionedPlan::from_stored(object_id, content);
        info!(
            "Created {} plan '{}' with {} linked service(s), ETag {} (request: '{}')",
            plan.plan_type,
            created.object_id(),
            plan.linked_plan_services.len(),
            created.etag(),
            context.request_id
        );
        Ok(CreateOutcome::Created(created))
    }

    /// Read a plan.
    ///
    /// When `if_none_match` matches the stored version only the version is
    /// returned.
    pub async fn read(
        &self,
        object_id: &str,
        if_none_match: Option<&Precondition>,
        context: &RequestContext,
    ) -> PlanResult<ReadOutcome> {
        debug!(
            "Reading plan '{}' (request: '{}')",
            object_id, context.request_id
        );

        let key = self.key_for(object_id);
        let content = self
            .store_call("get", &key, self.storage.get(&key))
            .await?
            .ok_or_else(|| {
                debug!("Plan '{}' not found", object_id);
                PlanError::not_found(object_id)
            })?;

        Self::check_stored_json(&key, &content)?;
        let plan = VersionedPlan::from_stored(object_id, content);

        if if_none_match.is_some_and(|condition| condition.matches(plan.version())) {
            debug!(
                "Plan '{}' unchanged since {} (request: '{}')",
                object_id,
                plan.etag(),
                context.request_id
            );
            return Ok(ReadOutcome::NotModified(plan.version().clone()));
        }

        trace!("Plan found and returned");
        Ok(ReadOutcome::Found(plan))
    }

    /// Replace a plan wholesale.
    ///
    /// Requires `if_match`. The new body must pass the schema gate and keep the
    /// same `objectId`.
    pub async fn replace(
        &self,
        object_id: &str,
        body: Value,
        if_match: Option<&Precondition>,
        context: &RequestContext,
    ) -> PlanResult<VersionedPlan> {
        info!(
            "Replacing plan '{}' (request: '{}', caller: '{}')",
            object_id,
            context.request_id,
            context.caller_subject()
        );
        trace!("Replace data: {}", body);

        let key = self.key_for(object_id);
        let _guard = self.locks.acquire(&key.to_string()).await;
        debug!("Acquired lock on {} (request: '{}')", key, context.request_id);

        self.load_for_update(&key, if_match, context).await?;

        let accepted = self.gate(&body, Some(object_id), context)?;
        self.commit(&key, accepted, context).await
    }

    /// Apply a merge patch to a plan.
    ///
    /// Same precondition protocol as [`PlanProvider::replace`]. The patch is
    /// merged into the stored document (objects recursively, other values
    /// replaced, `null` removing a member) and the merged result must pass the
    /// schema gate as a whole.
    pub async fn patch(
        &self,
        object_id: &str,
        partial: Value,
        if_match: Option<&Precondition>,
        context: &RequestContext,
    ) -> PlanResult<VersionedPlan> {
        info!(
            "Patching plan '{}' (request: '{}', caller: '{}')",
            object_id,
            context.request_id,
            context.caller_subject()
        );
        trace!("Patch data: {}", partial);

        let key = self.key_for(object_id);
        let _guard = self.locks.acquire(&key.to_string()).await;
        debug!("Acquired lock on {} (request: '{}')", key, context.request_id);

        let (stored, current) = self.load_for_update(&key, if_match, context).await?;

        let mut merged: Value = serde_json::from_slice(&stored)
            .map_err(|e| StorageError::data_corruption(key.to_string(), e.to_string()))?;
        merge_patch(&mut merged, &partial);
        trace!("Merged document: {}", merged);

        let accepted = self.gate(&merged, Some(object_id), context)?;

        if accepted.canonical_bytes() == stored.as_slice() {
            debug!(
                "Patch leaves plan '{}' unchanged at {} (request: '{}')",
                object_id,
                HttpVersion::from(current),
                context.request_id
            );
            return Ok(VersionedPlan::from_stored(object_id, stored));
        }

        self.commit(&key, accepted, context).await
    }

    /// Delete a plan.
    ///
    /// `if_match` is optional. When present it must match the stored version.
    pub async fn delete(
        &self,
        object_id: &str,
        if_match: Option<&Precondition>,
        context: &RequestContext,
    ) -> PlanResult<()> {
        info!(
            "Deleting plan '{}' (request: '{}', caller: '{}')",
            object_id,
            context.request_id,
            context.caller_subject()
        );

        let key = self.key_for(object_id);
        let _guard = self.locks.acquire(&key.to_string()).await;
        debug!("Acquired lock on {} (request: '{}')", key, context.request_id);

        if let Some(condition) = if_match {
            let current = self
                .current_version(&key)
                .await?
                .ok_or_else(|| PlanError::not_found(object_id))?;
            Self::check_if_match(object_id, condition, current, context)?;
        }

        let removed = self
            .store_call("delete", &key, self.storage.delete(&key))
            .await?;

        if !removed {
            warn!(
                "Attempted to delete non-existent plan '{}' (request: '{}')",
                object_id, context.request_id
            );
            return Err(PlanError::not_found(object_id));
        }

        debug!("Successfully deleted plan '{}'", object_id);
        Ok(())
    }

    /// Every stored plan, in key order.
    ///
    /// Keys that disappear between listing and fetching are skipped. An empty
    /// result is [`PlanError::NoPlans`].
    pub async fn list(&self, context: &RequestContext) -> PlanResult<Vec<Value>> {
        debug!("Listing plans (request: '{}')", context.request_id);

        let prefix = StorageKey::prefix(&self.key_prefix);
        let keys = self
            .store_call_for("list_keys", &prefix.to_string(), self.storage.list_keys(&prefix))
            .await?;

        let mut plans = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(content) = self.store_call("get", &key, self.storage.get(&key)).await? else {
                debug!("Plan under {} vanished during listing", key);
                continue;
            };
            let plan: Value = serde_json::from_slice(&content)
                .map_err(|e| StorageError::data_corruption(key.to_string(), e.to_string()))?;
            plans.push(plan);
        }

        if plans.is_empty() {
            debug!("No plans found (request: '{}')", context.request_id);
            return Err(PlanError::NoPlans);
        }

        debug!("Found {} plans", plans.len());
        Ok(plans)
    }

    /// Run the schema gate plus the id rules the schema cannot express.
    fn gate(
        &self,
        body: &Value,
        path_id: Option<&str>,
        context: &RequestContext,
    ) -> PlanResult<AcceptedPlan> {
        let accepted = self.schema.validate(body).map_err(|rejection| {
            match &rejection {
                GateError::Rejected(errors) => warn!(
                    "Rejected plan body with {} violation(s) (request: '{}'): {}",
                    errors.len(),
                    context.request_id,
                    errors
                ),
                GateError::ModelMismatch(detail) => error!(
                    "Schema accepted a body the plan model rejects (request: '{}'): {}",
                    context.request_id, detail
                ),
            }
            PlanError::from(rejection)
        })?;

        let object_id = accepted.plan().object_id.as_str();
        let id_violation = if object_id.is_empty() {
            Some("must not be empty".to_string())
        } else {
            match path_id {
                Some(expected) if expected != object_id => Some(format!(
                    "cannot be changed (expected '{}', got '{}')",
                    expected, object_id
                )),
                _ => None,
            }
        };

        if let Some(reason) = id_violation {
            warn!(
                "Rejected plan body (request: '{}'): objectId {}",
                context.request_id, reason
            );
            return Err(ValidationErrors::single("objectId", reason).into());
        }

        Ok(accepted)
    }

    /// Steps shared by replace and patch: the plan must exist, `if_match`
    /// must be present and must match. Returns the stored bytes and version.
    async fn load_for_update(
        &self,
        key: &StorageKey,
        if_match: Option<&Precondition>,
        context: &RequestContext,
    ) -> PlanResult<(Vec<u8>, RawVersion)> {
        let object_id = key.object_id();
        let stored = self
            .store_call("get", key, self.storage.get(key))
            .await?
            .ok_or_else(|| {
                debug!("Plan '{}' not found", object_id);
                PlanError::not_found(object_id)
            })?;
        let current = RawVersion::from_content(&stored);

        let Some(condition) = if_match else {
            warn!(
                "Refusing to modify plan '{}' without If-Match (request: '{}')",
                object_id, context.request_id
            );
            return Err(PlanError::precondition_missing(object_id));
        };
        Self::check_if_match(object_id, condition, current.clone(), context)?;

        Ok((stored, current))
    }

    fn check_if_match(
        object_id: &str,
        condition: &Precondition,
        current: RawVersion,
        context: &RequestContext,
    ) -> PlanResult<()> {
        if condition.matches(&current) {
            debug!(
                "If-Match {} satisfied for plan '{}' (request: '{}')",
                condition, object_id, context.request_id
            );
            return Ok(());
        }

        warn!(
            "If-Match {} does not match plan '{}' at '{}' (request: '{}')",
            condition, object_id, current, context.request_id
        );
        Err(PlanError::PreconditionFailed(
            VersionConflict::standard_message(condition, current),
        ))
    }

    async fn commit(
        &self,
        key: &StorageKey,
        accepted: AcceptedPlan,
        context: &RequestContext,
    ) -> PlanResult<VersionedPlan> {
        let (plan, content) = accepted.into_parts();
        self.store_call("put", key, self.storage.put(key, content.clone()))
            .await?;

        let updated = VersionedPlan::from_stored(key.object_id(), content);
        info!(
            "Stored {} plan '{}' with {} linked service(s), ETag {} (request: '{}')",
            plan.plan_type,
            updated.object_id(),
            plan.linked_plan_services.len(),
            updated.etag(),
            context.request_id
        );
        Ok(updated)
    }

    async fn current_version(&self, key: &StorageKey) -> PlanResult<Option<RawVersion>> {
        let content = self.store_call("get", key, self.storage.get(key)).await?;
        Ok(content.map(|bytes| RawVersion::from_content(&bytes)))
    }

    fn check_stored_json(key: &StorageKey, content: &[u8]) -> Result<(), StorageError> {
        serde_json::from_slice::<serde::de::IgnoredAny>(content)
            .map(|_| ())
            .map_err(|e| StorageError::data_corruption(key.to_string(), e.to_string()))
    }

    async fn store_call<T>(
        &self,
        operation: &'static str,
        key: &StorageKey,
        call: impl Future<Output = Result<T, S::Error>>,
    ) -> Result<T, StorageError> {
        self.store_call_for(operation, &key.to_string(), call).await
    }

    /// Bound a store call by the configured timeout and convert its error.
    async fn store_call_for<T>(
        &self,
        operation: &'static str,
        target: &str,
        call: impl Future<Output = Result<T, S::Error>>,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let error: StorageError = e.into();
                warn!("Store error during {} on {}: {}", operation, target, error);
                Err(error)
            }
            Err(_) => {
                warn!(
                    "Store {} on {} timed out after {:?}",
                    operation, target, self.store_timeout
                );
                Err(StorageError::timeout(operation, self.store_timeout))
            }
        }
    }
}
