use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hopper_core::config::{SNAPSHOT_PREVIEW_LEN, STATS_INTERVAL_SECS};
use hopper_core::events::QueueEvent;
use hopper_core::message::{now_iso, Message, StatsSnapshot};
use hopper_core::types::Counter;
use hopper_queue::{QueueStore, StoreError};

/// Build a point-in-time view of the queue: its length, running counters,
/// and the oldest few undelivered messages (head first).
///
/// Undecodable entries still count toward the length but are skipped in
/// the preview.
pub async fn collect_snapshot(
    store: &dyn QueueStore,
    produced: u64,
    consumed: u64,
) -> Result<StatsSnapshot, StoreError> {
    let queue_length = store.len().await?;
    let preview = store
        .peek_range(0, SNAPSHOT_PREVIEW_LEN as isize - 1)
        .await?;
    let recent_messages = preview
        .iter()
        .filter_map(|raw| match Message::decode(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("skipping undecodable entry in snapshot: {e}");
                None
            }
        })
        .collect();

    Ok(StatsSnapshot {
        queue_length,
        consumed_count: consumed,
        produced_count: produced,
        recent_messages,
        timestamp: now_iso(),
    })
}

pub(crate) struct StatsContext {
    pub store: Arc<dyn QueueStore>,
    pub produced: Counter,
    pub consumed: Counter,
    pub events: broadcast::Sender<QueueEvent>,
    pub token: CancellationToken,
}

/// Emit a snapshot every second while the pipeline is active. The first
/// one goes out immediately so a fresh client is not left staring at
/// nothing for a second.
pub(crate) async fn run(ctx: StatsContext) {
    debug!("stats emitter started");
    let mut interval = tokio::time::interval(Duration::from_secs(STATS_INTERVAL_SECS));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = collect_snapshot(
                    ctx.store.as_ref(),
                    ctx.produced.get(),
                    ctx.consumed.get(),
                )
                .await;
                match snapshot {
                    Ok(snapshot) => {
                        let _ = ctx.events.send(QueueEvent::QueueStats(snapshot));
                    }
                    // Keep ticking; the store may come back.
                    Err(e) => warn!("stats snapshot failed: {e}"),
                }
            }
            _ = ctx.token.cancelled() => break,
        }
    }
    debug!("stats emitter stopped");
}
