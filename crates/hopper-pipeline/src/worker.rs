use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hopper_core::config::{PipelineConfig, PROGRESS_LOG_EVERY, STORE_RETRY_BACKOFF_SECS};
use hopper_core::events::QueueEvent;
use hopper_core::message::Message;
use hopper_core::types::Counter;
use hopper_queue::QueueStore;

pub(crate) struct WorkerContext {
    pub id: usize,
    pub store: Arc<dyn QueueStore>,
    pub config: PipelineConfig,
    pub consumed: Counter,
    pub events: broadcast::Sender<QueueEvent>,
    pub token: CancellationToken,
}

/// Consumer loop: block on the queue head, decode, count, fan out.
///
/// The blocking wait is never cancelled mid-flight. Once the store hands
/// out an entry it exists nowhere else, so the worker always finishes the
/// current wait and delivers before honoring a stop request.
pub(crate) async fn run(ctx: WorkerContext) {
    let Some(store) = acquire_dedicated(&ctx).await else {
        return;
    };
    debug!(worker = ctx.id, "consumer worker started");
    let poll_timeout = Duration::from_secs(ctx.config.poll_timeout_secs);

    loop {
        match store.dequeue_blocking(poll_timeout).await {
            Ok(Some(raw)) => match Message::decode(&raw) {
                Ok(message) => {
                    let consumed = ctx.consumed.incr();
                    // No receivers just means nobody is listening yet.
                    let _ = ctx.events.send(QueueEvent::QueueMessage(message));
                    if consumed % PROGRESS_LOG_EVERY == 0 {
                        info!(consumed, "delivery progress");
                    }
                }
                Err(e) => {
                    if ctx.config.stop_on_error {
                        error!(worker = ctx.id, "undecodable entry, worker exiting: {e}");
                        return;
                    }
                    warn!(worker = ctx.id, "undecodable entry dropped: {e}");
                }
            },
            // Poll timeout elapsed with an empty queue.
            Ok(None) => {}
            Err(e) => {
                warn!(worker = ctx.id, "dequeue failed: {e}");
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(STORE_RETRY_BACKOFF_SECS)) => {}
                    _ = ctx.token.cancelled() => {}
                }
            }
        }

        if ctx.token.is_cancelled() {
            break;
        }
    }
    debug!(worker = ctx.id, "consumer worker stopped");
}

/// Blocking consumers need a store connection of their own. Retry until
/// one is available or the pipeline deactivates.
async fn acquire_dedicated(ctx: &WorkerContext) -> Option<Box<dyn QueueStore>> {
    loop {
        match ctx.store.dedicated().await {
            Ok(store) => return Some(store),
            Err(e) => {
                warn!(worker = ctx.id, "no dedicated store connection: {e}");
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(STORE_RETRY_BACKOFF_SECS)) => {}
                    _ = ctx.token.cancelled() => return None,
                }
            }
        }
    }
}
