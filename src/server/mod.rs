//! HTTP mapping layer.
//!
//! Routes under `/v1/plans` are served by [`handlers`]; every route sits
//! behind the bearer-token middleware, and every response carries an
//! `X-Request-Id`.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | POST | `/v1/plans` | create |
//! | GET | `/v1/plans`, `/v1/plans/` | list |
//! | GET | `/v1/plans/{id}` | read |
//! | PUT | `/v1/plans/{id}` | replace |
//! | PATCH | `/v1/plans/{id}` | partial update |
//! | DELETE | `/v1/plans/{id}` | delete |

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;

use crate::auth::Verifier;
use crate::config::{ConfigError, ServerConfig};
use crate::providers::PlanProvider;
use crate::schema::PlanSchema;
use crate::storage::StorageProvider;
use axum::Router;
use axum::routing::{get, post};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use middleware::{REQUEST_ID_HEADER, RequestId};

/// Shared state handed to every handler.
pub struct AppState<S: StorageProvider> {
    pub provider: Arc<PlanProvider<S>>,
    pub verifier: Arc<Verifier>,
}

impl<S: StorageProvider> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<S: StorageProvider> AppState<S> {
    pub fn new(provider: PlanProvider<S>, verifier: Verifier) -> Self {
        Self {
            provider: Arc::new(provider),
            verifier: Arc::new(verifier),
        }
    }

    /// Assemble the engine and verifier described by `config` around `storage`.
    pub fn from_config(config: &ServerConfig, storage: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let schema = PlanSchema::new().map_err(|e| ConfigError::Schema(e.to_string()))?;
        let provider = PlanProvider::new(storage, schema)
            .with_key_prefix(config.key_prefix.clone())
            .with_store_timeout(config.store_timeout);
        let verifier = Verifier::from_config(&config.auth)?;
        Ok(Self::new(provider, verifier))
    }
}

/// Build the HTTP router for the given state.
pub fn build_router<S: StorageProvider + 'static>(state: AppState<S>) -> Router {
    let verifier = Arc::clone(&state.verifier);

    Router::new()
        .route(
            "/v1/plans",
            post(handlers::create_plan::<S>).get(handlers::list_plans::<S>),
        )
        .route("/v1/plans/", get(handlers::list_plans::<S>))
        .route(
            "/v1/plans/{id}",
            get(handlers::get_plan::<S>)
                .put(handlers::replace_plan::<S>)
                .patch(handlers::patch_plan::<S>)
                .delete(handlers::delete_plan::<S>),
        )
        .layer(axum::middleware::from_fn_with_state(
            verifier,
            middleware::authenticate,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve on an already bound listener until ctrl-c.
pub async fn serve_listener<S: StorageProvider + 'static>(
    listener: TcpListener,
    state: AppState<S>,
) -> Result<(), ServerError> {
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Plan server stopped");
    Ok(())
}

/// Bind `config.bind_addr` and serve plans from `storage`.
pub async fn serve<S: StorageProvider + 'static>(
    config: ServerConfig,
    storage: S,
) -> Result<(), ServerError> {
    let state = AppState::from_config(&config, storage)?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "Plan server listening on {} (key prefix '{}', store timeout {:?}, auth {:?})",
        listener.local_addr()?,
        config.key_prefix,
        config.store_timeout,
        config.auth
    );
    serve_listener(listener, state).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
