//! WebSocket connection lifecycle — read loop, frame dispatch, cleanup.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use badil_core::protocol::{ClientFrame, ServerFrame};
use badil_providers::InferenceBackend;

use crate::analysis::run_analysis;
use crate::state::{ConnectionState, GatewayState};

/// Handle a new analyze-socket connection.
pub async fn handle_ws_connection<B: InferenceBackend + 'static>(
    state: Arc<GatewayState<B>>,
    ws: WebSocket,
) {
    let conn_id = Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "New WebSocket connection");

    let (mut ws_tx, mut ws_rx) = ws.split();

    // Result frames flow through a channel so the analysis pipeline can
    // push partial results while later stages still run.
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<ServerFrame>();

    {
        let mut connections = state.connections.write().await;
        connections.insert(
            conn_id.clone(),
            ConnectionState {
                conn_id: conn_id.clone(),
                frame_tx: frame_tx.clone(),
            },
        );
    }

    let send_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg_result) = ws_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => {
                        debug!(conn_id = %conn_id, "Dispatching analysis request");
                        run_analysis(&state, frame, &frame_tx).await;
                    }
                    Err(e) => {
                        warn!(conn_id = %conn_id, %e, "Invalid frame received");
                        let _ = frame_tx.send(ServerFrame::Error(
                            "Expected {\"image_data\": ...} or {\"company_name\": ...}".into(),
                        ));
                    }
                }
            }
            Ok(Message::Ping(_)) => {
                // Axum answers pings automatically.
            }
            Ok(Message::Close(_)) => {
                debug!(conn_id = %conn_id, "Client requested close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    {
        let mut connections = state.connections.write().await;
        connections.remove(&conn_id);
    }
    info!(conn_id = %conn_id, "WebSocket connection closed");
}
