//! HTTP handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Open WebSocket connections.
    pub connections: usize,
    /// Codes waiting for a joiner.
    pub active_codes: usize,
}

/// Health check endpoint.
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: state.hub.connection_count(),
        active_codes: state.broker.pairing().registry().len().await,
    })
}
