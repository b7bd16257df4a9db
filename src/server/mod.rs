//! HTTP boundary for sqlgate.
//!
//! Routes:
//! - `GET /health` (unauthenticated)
//! - `GET /query?sql=...` and `POST /query` (require `X-API-Key`)

mod auth;
mod correlation;
mod handlers;
mod response;

pub use auth::API_KEY_HEADER;
pub use correlation::{new_correlation_id, CORRELATION_HEADER};
pub use handlers::{HealthResponse, QueryParams};
pub use response::{render, ApiError, ErrorBody, ErrorMetadata, SuccessBody, SuccessMetadata};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::db::DatabaseConnector;
use crate::error::{GatewayError, Result};
use crate::query::QueryPipeline;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<QueryPipeline>,
    api_key: Arc<str>,
}

impl AppState {
    /// Creates state from a pipeline and the expected API key.
    pub fn new(pipeline: QueryPipeline, api_key: impl Into<String>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            api_key: Arc::from(api_key.into()),
        }
    }

    /// Builds the pipeline from configuration.
    pub fn from_config(config: &GatewayConfig, connector: Arc<dyn DatabaseConnector>) -> Result<Self> {
        let pipeline = QueryPipeline::from_config(config, connector)?;
        Ok(Self::new(pipeline, config.api_key.clone()))
    }

    /// The query pipeline.
    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }

    fn api_key_matches(&self, candidate: &str) -> bool {
        !self.api_key.is_empty() && candidate == &*self.api_key
    }
}

/// Builds the router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/query", get(handlers::query_get).post(handlers::query_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &GatewayConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = config.server.bind.parse().map_err(|e| {
        GatewayError::config(format!("Invalid bind address '{}': {e}", config.server.bind))
    })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(%addr, "sqlgate listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
