use super::processor::{ChunkContext, RelayPayload};
use super::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, info, warn};

/// GET /api/ws
/// Upgrade to the relay socket
pub async fn relay_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_relay_socket(socket, state))
}

/// One relay connection: one reply per inbound message until the client
/// goes away
async fn handle_relay_socket(mut socket: WebSocket, state: AppState) {
    let connection_id = state.stats.connection_opened();
    info!("Relay client {} connected", connection_id);

    let mut sequence = 0;
    let mut bytes = 0;

    while let Some(msg) = socket.recv().await {
        let payload = match msg {
            Ok(Message::Binary(data)) => RelayPayload::Binary(data),
            Ok(Message::Text(text)) => RelayPayload::Text(text),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // Ping/Pong
            Err(e) => {
                warn!("Relay client {} error: {}", connection_id, e);
                break;
            }
        };

        debug!(
            "Relay client {} sent message {} ({} bytes)",
            connection_id,
            sequence,
            payload.len()
        );
        state.stats.message_received(payload.len());
        bytes += payload.len();

        let ctx = ChunkContext {
            connection_id,
            sequence,
        };
        let reply = state.processor.process(&ctx, payload).await;

        if socket.send(Message::Text(reply)).await.is_err() {
            // Client disconnected
            break;
        }
        state.stats.reply_sent();
        sequence += 1;
    }

    state.stats.connection_closed();
    info!(
        "Relay client {} disconnected ({} messages, {} bytes)",
        connection_id, sequence, bytes
    );
}

/// GET /api/relay/status
/// Relay traffic counters
pub async fn relay_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.stats.snapshot()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
