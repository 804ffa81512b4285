use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::app::AppState;

/// Axum handler — upgrades HTTP to WebSocket at GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection event loop — lives for the entire WS session. The
/// connection counts toward the pipeline lifecycle from upgrade until
/// this function returns.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "new WS connection");

    let (mut tx, mut rx) = socket.split();
    let mut events = state.broadcaster.subscribe();
    let _guard = state.pipeline.register(conn_id.clone());

    loop {
        tokio::select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(conn_id, "WS receive error: {e}");
                        break;
                    }
                    // inbound text/binary is not part of the protocol
                    _ => {}
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let frame = match event.to_frame() {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(conn_id, "event encode failed: {e}");
                                continue;
                            }
                        };
                        if tx.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(conn_id, missed, "client lagging; events skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!(conn_id, "WS connection closed");
}
