use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Instant};

use {
    scribe_config::ScribeConfig,
    scribe_protocol::{OutboundFrame, SERVER_PRODUCT},
    scribe_storage::Store,
    tokio::sync::{RwLock, mpsc},
    tracing::debug,
};

use crate::version;

// ── Connected client ─────────────────────────────────────────────────────────

/// A WebSocket client currently connected to the gateway.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: String,
    pub remote_addr: SocketAddr,
    /// Channel for sending serialized frames to this client's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    pub fn new(
        conn_id: impl Into<String>,
        remote_addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            conn_id: conn_id.into(),
            remote_addr,
            sender,
            connected_at: Instant::now(),
        }
    }

    /// Send a serialized JSON frame to this client.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(frame.to_string()).is_ok()
    }
}

// ── Gateway state ────────────────────────────────────────────────────────────

/// Shared gateway runtime state, wrapped in Arc for use across async tasks.
pub struct GatewayState {
    /// All connected WebSocket clients, keyed by conn_id.
    pub clients: RwLock<HashMap<String, ConnectedClient>>,
    /// Build fingerprint (git short id or crate version).
    pub version: String,
    /// Value of the `Server` response header.
    pub server_name: String,
    pub storage: Arc<dyn Store>,
    pub config: Arc<ScribeConfig>,
}

impl GatewayState {
    pub fn new(storage: Arc<dyn Store>, config: Arc<ScribeConfig>) -> Arc<Self> {
        Self::with_version(storage, config, version::fingerprint())
    }

    pub fn with_version(
        storage: Arc<dyn Store>,
        config: Arc<ScribeConfig>,
        version: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            clients: RwLock::new(HashMap::new()),
            server_name: format!("{SERVER_PRODUCT} {version}"),
            version,
            storage,
            config,
        })
    }

    /// Register a new client connection.
    pub async fn register_client(&self, client: ConnectedClient) {
        let conn_id = client.conn_id.clone();
        self.clients.write().await.insert(conn_id, client);
    }

    /// Remove a client by conn_id. Returns the removed client if found.
    pub async fn remove_client(&self, conn_id: &str) -> Option<ConnectedClient> {
        self.clients.write().await.remove(conn_id)
    }

    /// Number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Queue a frame for one client. False if the client is gone.
    pub async fn send_to(&self, conn_id: &str, frame: &OutboundFrame) -> bool {
        let clients = self.clients.read().await;
        match clients.get(conn_id) {
            Some(client) => client.send(&frame.to_json()),
            None => {
                debug!(conn_id, kind = %frame.kind, "dropping frame for unknown client");
                false
            },
        }
    }

    /// Queue a frame for each of `conn_ids`, skipping clients that are gone.
    pub async fn send_to_many<'a>(
        &self,
        conn_ids: impl IntoIterator<Item = &'a str>,
        frame: &OutboundFrame,
    ) -> usize {
        let text = frame.to_json();
        let clients = self.clients.read().await;
        conn_ids
            .into_iter()
            .filter_map(|id| clients.get(id))
            .filter(|client| client.send(&text))
            .count()
    }
}
