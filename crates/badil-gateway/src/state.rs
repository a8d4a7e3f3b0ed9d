//! Gateway shared state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use badil_analyzer::Catalog;
use badil_core::config::Config;
use badil_core::protocol::ServerFrame;
use badil_providers::{FailoverEngine, InferenceBackend};

/// Shared gateway state accessible from all connections.
///
/// Generic over the inference backend so the analysis pipeline can run
/// against a scripted backend in tests.
pub struct GatewayState<B: InferenceBackend> {
    pub config: Arc<Config>,
    pub engine: FailoverEngine<B>,
    pub catalog: Catalog,
    pub connections: RwLock<HashMap<String, ConnectionState>>,
}

/// Per-connection state.
pub struct ConnectionState {
    pub conn_id: String,
    pub frame_tx: mpsc::UnboundedSender<ServerFrame>,
}

impl<B: InferenceBackend> GatewayState<B> {
    pub fn new(config: Arc<Config>, engine: FailoverEngine<B>, catalog: Catalog) -> Self {
        Self {
            config,
            engine,
            catalog,
            connections: RwLock::new(HashMap::new()),
        }
    }
}
