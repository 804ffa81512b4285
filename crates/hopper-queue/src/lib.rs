//! Queue storage for the hopper pipeline.
//!
//! One trait pair ([`QueueStore`] for the FIFO list, [`KvCache`] for the
//! small cache beside it) with two backends: Redis for real deployments
//! and an in-memory store for tests and standalone runs.

pub mod error;
pub mod memory;
pub mod redis;
pub mod store;

use std::sync::Arc;

use hopper_core::config::{QueueBackend, QueueConfig};

pub use crate::error::{Result, StoreError};
pub use crate::memory::MemoryStore;
pub use crate::redis::RedisStore;
pub use crate::store::{KvCache, QueueStore};

/// Build the configured backend, returning the queue and cache facets of
/// one underlying store.
pub async fn connect(config: &QueueConfig) -> Result<(Arc<dyn QueueStore>, Arc<dyn KvCache>)> {
    match config.backend {
        QueueBackend::Redis => {
            let store = Arc::new(RedisStore::connect(config).await?);
            let queue: Arc<dyn QueueStore> = store.clone();
            let cache: Arc<dyn KvCache> = store;
            Ok((queue, cache))
        }
        QueueBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let queue: Arc<dyn QueueStore> = store.clone();
            let cache: Arc<dyn KvCache> = store;
            Ok((queue, cache))
        }
    }
}
