//! Websocket listener endpoint.
//!
//! Each connection registers with the client registry and forwards queued
//! frames to its socket: binary frames carry audio, text frames carry JSON
//! announcements. Incoming messages are ignored; the read side exists only
//! to detect disconnection, which unregisters the endpoint.

use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use pulsecast::Frame;
use tracing::{debug, info};

/// `GET /listen` - upgrade and join the broadcast.
pub async fn listen(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_to_listener(socket, state))
}

async fn stream_to_listener(mut socket: WebSocket, state: AppState) {
    let (client_id, mut frames) = state.registry.register();
    info!(
        client = %client_id,
        listeners = state.registry.len(),
        "listener connected"
    );

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                let message = match frame {
                    Frame::Audio(bytes) => Message::Binary(bytes),
                    Frame::Text(text) => Message::Text(text.into()),
                };
                if socket.send(message).await.is_err() {
                    debug!(client = %client_id, "listener write failed");
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Any read error or close terminates the connection.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.registry.unregister(client_id);
    info!(
        client = %client_id,
        listeners = state.registry.len(),
        "listener disconnected"
    );
}
