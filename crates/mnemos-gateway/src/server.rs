// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use mnemos_agent::AgentService;
use mnemos_core::MnemosError;
use tokio_util::sync::CancellationToken;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The service every route delegates to.
    pub service: Arc<AgentService>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(service: Arc<AgentService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server configuration (mirrors `[server]` from mnemos-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Requests handled at once across all routes.
    pub max_concurrent_requests: usize,
}

/// Builds the full route table.
pub fn router(state: GatewayState) -> Router {
    let agent_routes = Router::new()
        .route(
            "/agents",
            post(handlers::create_agent).get(handlers::list_agents),
        )
        .route(
            "/agents/{id}",
            get(handlers::get_agent).delete(handlers::delete_agent),
        )
        .route("/agents/{id}/messages", post(handlers::send_message))
        .route("/agents/{id}/mail", post(handlers::send_mail));

    let memory_routes = Router::new()
        .route("/agents/{id}/memory/core", get(handlers::get_core_memory))
        .route(
            "/agents/{id}/memory/core/{key}",
            post(handlers::set_core_memory).delete(handlers::delete_core_memory),
        )
        .route("/agents/{id}/memory/recall", get(handlers::get_recall))
        .route(
            "/agents/{id}/memory/recall/search",
            get(handlers::search_recall),
        )
        .route(
            "/agents/{id}/memory/archival",
            post(handlers::insert_archival),
        )
        .route(
            "/agents/{id}/memory/archival/search",
            get(handlers::search_archival),
        )
        .route(
            "/agents/{id}/memory/archival/{item_id}",
            get(handlers::get_archival).delete(handlers::delete_archival),
        )
        .route("/agents/{id}/memory/stats", get(handlers::get_memory_stats));

    Router::new()
        .route("/health", get(handlers::get_health))
        .merge(agent_routes)
        .merge(memory_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the gateway until `shutdown` is cancelled, then drains in-flight
/// requests before returning.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), MnemosError> {
    let app = router(state).layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MnemosError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    info!(
        max_concurrent_requests = config.max_concurrent_requests,
        "gateway listening on {addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| MnemosError::Internal(format!("gateway server error: {e}")))?;

    info!("gateway stopped accepting connections");
    Ok(())
}
