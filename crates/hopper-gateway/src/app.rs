use std::sync::Arc;

use axum::{routing::get, Router};

use hopper_core::config::HopperConfig;
use hopper_pipeline::PipelineHandle;
use hopper_producer::ProducerHandle;
use hopper_queue::{KvCache, QueueStore};

use crate::broadcast::EventBroadcaster;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: HopperConfig,
    pub store: Arc<dyn QueueStore>,
    pub cache: Arc<dyn KvCache>,
    pub broadcaster: EventBroadcaster,
    pub producer: ProducerHandle,
    pub pipeline: PipelineHandle,
}

impl AppState {
    pub fn new(
        config: HopperConfig,
        store: Arc<dyn QueueStore>,
        cache: Arc<dyn KvCache>,
        broadcaster: EventBroadcaster,
        producer: ProducerHandle,
        pipeline: PipelineHandle,
    ) -> Self {
        Self {
            config,
            store,
            cache,
            broadcaster,
            producer,
            pipeline,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::hello_handler))
        .route("/health", get(crate::http::health_handler))
        .route("/queue", get(crate::http::queue_handler))
        .route("/ws", get(crate::ws::ws_handler))
        .route("/events", get(crate::sse::sse_handler))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
