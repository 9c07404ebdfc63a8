//! Luna server library logic.

pub mod api;
pub mod config;

use axum::{routing::get, Extension, Json, Router};
use luna_voice::{AgentConfig, VoiceService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all request handlers.
pub struct AppState {
    /// LiveKit token issuance.
    pub voice_service: Arc<VoiceService>,
    /// Agent settings advertised to clients.
    pub agent: AgentConfig,
    /// Connection request defaults.
    pub connection: config::ConnectionConfig,
}

impl AppState {
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            voice_service: Arc::new(VoiceService::new(config.livekit.clone())),
            agent: config.agent.clone(),
            connection: config.connection.clone(),
        }
    }
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version. Used by load balancers,
/// monitoring, and CI to verify the server is running.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/connection-details",
            get(api::connection_details_handler),
        )
        .route("/api/agent", get(api::agent_info_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
