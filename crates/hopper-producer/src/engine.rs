use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use hopper_core::config::{ProducerConfig, STORE_RETRY_BACKOFF_SECS};
use hopper_core::message::{now_iso, Message};
use hopper_core::palette;
use hopper_core::types::Counter;
use hopper_queue::QueueStore;

/// Shared view of a running producer: read the produced count, ask it to
/// stop. Stopping twice is a no-op.
#[derive(Clone)]
pub struct ProducerHandle {
    produced: Counter,
    stop: watch::Sender<bool>,
}

impl ProducerHandle {
    /// Messages successfully enqueued since the process started.
    pub fn produced(&self) -> u64 {
        self.produced.get()
    }

    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// Produces messages back to back until stopped.
///
/// The id of the next message is always `produced + 1` and the counter
/// only advances on a successful enqueue, so a failed attempt is retried
/// under the same id (with a fresh timestamp and color) instead of
/// leaving a hole in the sequence.
pub struct ProducerEngine {
    store: Arc<dyn QueueStore>,
    config: ProducerConfig,
    produced: Counter,
    shutdown: watch::Receiver<bool>,
}

impl ProducerEngine {
    /// Build an engine plus the handle that controls it. The `produced`
    /// counter is shared so stats readers see the same number.
    pub fn new(
        store: Arc<dyn QueueStore>,
        config: ProducerConfig,
        produced: Counter,
    ) -> (Self, ProducerHandle) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = ProducerHandle {
            produced: produced.clone(),
            stop: stop_tx,
        };
        let engine = Self {
            store,
            config,
            produced,
            shutdown: stop_rx,
        };
        (engine, handle)
    }

    /// Main production loop. Returns once the handle's `stop` is called.
    pub async fn run(mut self) {
        info!(
            store = self.store.name(),
            interval_ms = self.config.interval_ms,
            "producer started"
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let message = build_message(self.produced.get() + 1);
            let entry = match message.encode() {
                Ok(entry) => entry,
                Err(e) => {
                    error!(id = message.id, "message encode failed: {e}");
                    self.pause(Duration::from_secs(STORE_RETRY_BACKOFF_SECS))
                        .await;
                    continue;
                }
            };

            match self.store.enqueue(&entry).await {
                Ok(_) => {
                    self.produced.incr();
                    if self.config.interval_ms > 0 {
                        self.pause(Duration::from_millis(self.config.interval_ms))
                            .await;
                    } else {
                        // Flat-out production must still yield so stop
                        // requests and consumers get polled.
                        tokio::task::yield_now().await;
                    }
                }
                Err(e) => {
                    warn!(
                        id = message.id,
                        "enqueue failed: {e}; retrying in {STORE_RETRY_BACKOFF_SECS}s"
                    );
                    self.pause(Duration::from_secs(STORE_RETRY_BACKOFF_SECS))
                        .await;
                }
            }
        }

        info!(produced = self.produced.get(), "producer stopped");
    }

    /// Sleep that wakes early when stop is requested.
    async fn pause(&mut self, duration: Duration) {
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.shutdown.changed() => {}
        }
    }
}

fn build_message(id: u64) -> Message {
    let color = palette::random_color();
    Message {
        id,
        timestamp: now_iso(),
        data: format!("Message {id}"),
        color: color.to_string(),
        primary_color: palette::closest_primary(color).to_string(),
    }
}
