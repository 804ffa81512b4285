use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::app::AppState;

/// GET /events — server-sent events fallback for clients that cannot hold
/// a WebSocket. Same named events, name in the SSE `event:` field and the
/// bare payload in `data:`. An SSE client counts toward the pipeline
/// lifecycle exactly like a WS one.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "new SSE connection");

    let mut events = state.broadcaster.subscribe();
    let guard = state.pipeline.register(conn_id.clone());

    let stream = async_stream::stream! {
        // the guard lives inside the stream; the client dropping the
        // response reports the disconnect
        let _guard = guard;
        loop {
            match events.recv().await {
                Ok(event) => match event.payload_json() {
                    Ok(data) => yield Ok(Event::default().event(event.name()).data(data)),
                    Err(e) => warn!(conn_id, "event encode failed: {e}"),
                },
                Err(RecvError::Lagged(missed)) => {
                    warn!(conn_id, missed, "client lagging; events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
