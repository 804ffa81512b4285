use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// FIFO queue backed by a shared store.
///
/// Entries are opaque strings; callers do their own serialization. Every
/// handle built from the same configuration addresses the same underlying
/// list, so producers and consumers in different tasks (or, with the Redis
/// backend, different processes) see one queue.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Append an entry at the tail. Returns the queue length right after
    /// the append.
    async fn enqueue(&self, entry: &str) -> Result<u64>;

    /// Atomically remove and return the head entry, or `None` when the
    /// queue is empty. Concurrent callers never observe the same entry.
    async fn dequeue(&self) -> Result<Option<String>>;

    /// Like [`dequeue`](QueueStore::dequeue), but wait up to `timeout` for
    /// an entry to arrive. A zero timeout waits indefinitely. Each entry
    /// wakes exactly one waiter.
    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>>;

    /// Number of entries currently queued.
    async fn len(&self) -> Result<u64>;

    /// Entries from `start` to `stop` inclusive, head first, without
    /// removing them. Negative indices count from the tail, `-1` being the
    /// last entry; out-of-range bounds are clamped.
    async fn peek_range(&self, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Drop every queued entry.
    async fn clear(&self) -> Result<()>;

    /// A handle with a connection of its own. Blocking consumers must use
    /// one, so a parked `dequeue_blocking` cannot stall unrelated callers
    /// sharing the default connection.
    async fn dedicated(&self) -> Result<Box<dyn QueueStore>>;
}

/// Small string cache living next to the queue (same Redis database, or
/// the same process memory for the in-memory backend).
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Store `value` under `key`, expiring after `ttl` when one is given.
    async fn kv_set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Value under `key`, or `None` when absent or expired.
    async fn kv_get(&self, key: &str) -> Result<Option<String>>;
}
