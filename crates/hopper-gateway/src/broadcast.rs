use tokio::sync::broadcast;

use hopper_core::events::QueueEvent;

const BROADCAST_CAPACITY: usize = 256;

/// Fan-out queue events to all connected clients via tokio broadcast
/// channel. A subscriber that falls more than `BROADCAST_CAPACITY` events
/// behind skips ahead and loses the overwritten ones.
pub struct EventBroadcaster {
    tx: broadcast::Sender<QueueEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// New client subscribes to the broadcast stream.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// Sender half, for the pipeline to publish through.
    pub fn sender(&self) -> broadcast::Sender<QueueEvent> {
        self.tx.clone()
    }
}
