// src/api/mod.rs — HTTP API server exposing the catalog and dispatch paths

pub mod auth;
pub mod handlers;
pub mod types;

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::infra::config::{OrgToken, ServerConfig};
use crate::integrations::dispatch::Dispatcher;
use crate::integrations::registry::IntegrationRegistry;
use crate::store::crypto::CredentialCipher;
use crate::store::InstanceStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<IntegrationRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<dyn InstanceStore>,
    pub cipher: Arc<CredentialCipher>,
    /// Bearer-token → organisation mapping (the authentication stand-in).
    pub org_tokens: Arc<Vec<OrgToken>>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/catalog", get(handlers::get_catalog))
        .route("/api/v1/integrations", get(handlers::list_integrations))
        .route("/api/v1/instances", get(handlers::list_instances))
        .route(
            "/api/v1/instances/{id}/credentials",
            put(handlers::put_credentials),
        )
        .route("/api/v1/instances/{id}/prompt", get(handlers::get_prompt))
        .route("/api/v1/execute", post(handlers::execute))
        .layer(cors)
        .with_state(state)
}

/// Start the API server (blocking until shutdown).
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
