//! Realtime transport: one WebSocket per client, shared by all components.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        extract::{
            ConnectInfo, State, WebSocketUpgrade,
            ws::{Message, WebSocket},
        },
        response::IntoResponse,
    },
    futures::{SinkExt, StreamExt},
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::{
    router::ComponentRouter,
    server::AppState,
    state::{ConnectedClient, GatewayState},
};

pub async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(app): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, app.gateway, app.components, addr))
}

/// Drive one client connection until the socket closes.
///
/// Frames are routed one at a time, so a component sees a connection's
/// messages in the order they arrived.
pub async fn handle_connection(
    socket: WebSocket,
    state: Arc<GatewayState>,
    components: Arc<ComponentRouter>,
    remote_addr: SocketAddr,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Outbound frames from any task go through this channel to the socket.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let write_conn_id = conn_id.clone();
    let write_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                debug!(conn_id = %write_conn_id, error = %e, "ws write failed");
                break;
            }
        }
    });

    state
        .register_client(ConnectedClient::new(conn_id.clone(), remote_addr, tx))
        .await;
    let clients = state.client_count().await;
    info!(
        conn_id = %conn_id,
        remote = %remote_addr,
        clients = clients,
        "ws: client connected"
    );
    components.connect(&conn_id).await;

    while let Some(msg) = ws_rx.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                debug!(conn_id = %conn_id, "ws: ignoring binary frame");
                continue;
            },
            Ok(_) => continue,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "ws: read error");
                break;
            },
        };
        components.route_text(&conn_id, text.as_str()).await;
    }

    components.disconnect(&conn_id).await;
    write_task.abort();
    if let Some(client) = state.remove_client(&conn_id).await {
        info!(
            conn_id = %conn_id,
            remote = %client.remote_addr,
            session_secs = client.connected_at.elapsed().as_secs(),
            "ws: client disconnected"
        );
    }
}
