//! WebSocket endpoint for live viewers.
//!
//! On upgrade the socket is registered with the broadcast hub; every
//! `DiffBatch` queued for this viewer is serialized and written as a text
//! frame. A freshly connected viewer receives the full current board as
//! its first batch, so it never needs a second request to bootstrap.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};

use super::AppState;

/// WebSocket upgrade handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

async fn handle_websocket(mut socket: WebSocket, state: AppState) {
    let mut handle = state.hub.connect().await;
    let viewer_id = handle.id;

    loop {
        tokio::select! {
            batch = handle.rx.recv() => {
                let Some(batch) = batch else {
                    // The hub dropped this viewer (overloaded queue).
                    break;
                };
                let json = match serde_json::to_string(&*batch) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(viewer = %viewer_id, error = %e, "failed to serialize diff batch");
                        break;
                    }
                };
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                // Viewers are read-only; client frames only matter for
                // detecting close.
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.disconnect(viewer_id).await;
}
