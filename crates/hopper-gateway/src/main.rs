use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use hopper_core::config::HopperConfig;
use hopper_core::types::Counter;
use hopper_pipeline::Lifecycle;
use hopper_producer::ProducerEngine;

mod app;
mod broadcast;
mod http;
mod sse;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path via HOPPER_CONFIG env > ./hopper.toml
    let config_path = std::env::var("HOPPER_CONFIG").ok();
    let config = HopperConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        HopperConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    // queue store first — the only fatal connection in the process
    info!(backend = ?config.queue.backend, key = %config.queue.key, "connecting queue store");
    let (store, cache) = hopper_queue::connect(&config.queue).await?;

    let produced = Counter::new();
    let broadcaster = broadcast::EventBroadcaster::new();

    // producer runs for the lifetime of the process
    let (producer_engine, producer) =
        ProducerEngine::new(store.clone(), config.producer.clone(), produced.clone());
    tokio::spawn(producer_engine.run());

    // consumer pipeline supervisor; workers start once a client connects
    let (lifecycle, pipeline) = Lifecycle::new(
        store.clone(),
        config.pipeline.clone(),
        produced,
        broadcaster.sender(),
    );
    tokio::spawn(lifecycle.run());

    let state = Arc::new(app::AppState::new(
        config,
        store,
        cache,
        broadcaster,
        producer,
        pipeline,
    ));
    let router = app::build_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Hopper gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal background loops to stop
    state.producer.stop();
    state.pipeline.stop();
    Ok(())
}
