use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use hopper_core::config::{HELLO_CACHE_KEY, HELLO_CACHE_TTL_SECS};
use hopper_core::message::StatsSnapshot;
use hopper_pipeline::collect_snapshot;

use crate::app::AppState;

/// GET /health — liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.name(),
        "queueKey": state.config.queue.key,
        "clients": state.pipeline.clients(),
    }))
}

/// GET / — fixed greeting, cached in the store for a minute. Cache
/// trouble downgrades to serving it uncached.
pub async fn hello_handler(State(state): State<Arc<AppState>>) -> String {
    match state.cache.kv_get(HELLO_CACHE_KEY).await {
        Ok(Some(cached)) => return cached,
        Ok(None) => {}
        Err(e) => warn!("hello cache read failed: {e}"),
    }

    let greeting = "Hello World!".to_string();
    if let Err(e) = state
        .cache
        .kv_set(
            HELLO_CACHE_KEY,
            &greeting,
            Some(Duration::from_secs(HELLO_CACHE_TTL_SECS)),
        )
        .await
    {
        warn!("hello cache write failed: {e}");
    }
    greeting
}

/// GET /queue — on-demand snapshot of the queue, same shape as the
/// periodic `queueStats` payload. Works whether or not the pipeline is
/// active.
pub async fn queue_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsSnapshot>, StatusCode> {
    collect_snapshot(
        state.store.as_ref(),
        state.producer.produced(),
        state.pipeline.consumed(),
    )
    .await
    .map(Json)
    .map_err(|e| {
        warn!("queue snapshot failed: {e}");
        StatusCode::SERVICE_UNAVAILABLE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use hopper_core::config::{HopperConfig, QueueBackend};
    use hopper_core::message::{now_iso, Message};
    use hopper_core::types::Counter;
    use hopper_pipeline::Lifecycle;
    use hopper_producer::ProducerEngine;

    use crate::broadcast::EventBroadcaster;

    /// AppState over the memory backend, with nothing spawned.
    async fn test_state() -> Arc<AppState> {
        let mut config = HopperConfig::default();
        config.queue.backend = QueueBackend::Memory;

        let (store, cache) = hopper_queue::connect(&config.queue).await.unwrap();
        let produced = Counter::new();
        let broadcaster = EventBroadcaster::new();
        let (_engine, producer) =
            ProducerEngine::new(store.clone(), config.producer.clone(), produced.clone());
        let (_lifecycle, pipeline) = Lifecycle::new(
            store.clone(),
            config.pipeline.clone(),
            produced,
            broadcaster.sender(),
        );
        Arc::new(AppState::new(
            config,
            store,
            cache,
            broadcaster,
            producer,
            pipeline,
        ))
    }

    #[tokio::test]
    async fn hello_is_cached_after_the_first_serve() {
        let state = test_state().await;

        assert_eq!(hello_handler(State(state.clone())).await, "Hello World!");
        assert_eq!(
            state.cache.kv_get(HELLO_CACHE_KEY).await.unwrap().as_deref(),
            Some("Hello World!")
        );

        // later calls read the cache, not the literal
        state
            .cache
            .kv_set(HELLO_CACHE_KEY, "still warm", None)
            .await
            .unwrap();
        assert_eq!(hello_handler(State(state)).await, "still warm");
    }

    #[tokio::test]
    async fn queue_snapshot_reports_the_backlog() {
        let state = test_state().await;
        for id in 1..=3u64 {
            let msg = Message {
                id,
                timestamp: now_iso(),
                data: format!("Message {id}"),
                color: "Azure".to_string(),
                primary_color: "White".to_string(),
            };
            state.store.enqueue(&msg.encode().unwrap()).await.unwrap();
        }

        let Json(snapshot) = queue_handler(State(state)).await.unwrap();
        assert_eq!(snapshot.queue_length, 3);
        assert_eq!(snapshot.consumed_count, 0);
        assert_eq!(snapshot.produced_count, 0);
        let ids: Vec<u64> = snapshot.recent_messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn health_reports_store_and_clients() {
        let state = test_state().await;
        let Json(body) = health_handler(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["clients"], 0);
    }
}
