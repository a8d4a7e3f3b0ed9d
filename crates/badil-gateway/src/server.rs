//! Axum-based WebSocket server.

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::info;

use badil_providers::InferenceBackend;

use crate::connection::handle_ws_connection;
use crate::state::GatewayState;

/// Start the gateway WebSocket server.
pub async fn start_gateway<B: InferenceBackend + 'static>(
    state: Arc<GatewayState<B>>,
    port: u16,
) -> anyhow::Result<()> {
    let bind_addr = state.config.gateway_bind();

    let app = Router::new()
        .route("/ws/analyze", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ws_handler<B: InferenceBackend + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState<B>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

async fn health_handler<B: InferenceBackend + 'static>(
    State(state): State<Arc<GatewayState<B>>>,
) -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let connections = state.connections.read().await.len();

    axum::Json(json!({
        "status": "ok",
        "version": version,
        "connections": connections,
    }))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Shutdown signal received");
}
