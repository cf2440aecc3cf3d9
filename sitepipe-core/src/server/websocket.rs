//! WebSocket endpoint feeding live reload clients.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::debug;

use super::state::{ReloadEvent, ServerState};

/// WebSocket upgrade handler.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Forward reload events to one connected client.
async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut events = state.subscribe();
    debug!("Live reload client connected");

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let msg = match event {
                ReloadEvent::Changed { paths } => serde_json::json!({
                    "type": "changed",
                    "paths": paths,
                }),
                ReloadEvent::Reload => serde_json::json!({
                    "type": "reload",
                }),
            };

            let json = serde_json::to_string(&msg).unwrap_or_default();
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // The client never sends commands; we only care about close.
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            debug!("Live reload client disconnected");
            break;
        }
    }

    send_task.abort();
}
