use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::Result;
use crate::store::{KvCache, QueueStore};

/// Process-local store for tests and standalone runs.
///
/// Clones share the same queue and cache, which is what `dedicated` hands
/// out — there is no real connection to isolate.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<VecDeque<String>>,
    notify: Notify,
    kv: DashMap<String, CacheEntry>,
}

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn pop_front(&self) -> Option<String> {
        self.shared.queue.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn enqueue(&self, entry: &str) -> Result<u64> {
        let len = {
            let mut queue = self.shared.queue.lock().unwrap();
            queue.push_back(entry.to_string());
            queue.len() as u64
        };
        self.shared.notify.notify_one();
        Ok(len)
    }

    async fn dequeue(&self) -> Result<Option<String>> {
        Ok(self.pop_front())
    }

    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>> {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let notified = self.shared.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register as a waiter before the emptiness check so an
            // enqueue between the two cannot be missed.
            notified.as_mut().enable();
            if let Some(entry) = self.pop_front() {
                return Ok(Some(entry));
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified.as_mut())
                        .await
                        .is_err()
                    {
                        // Deadline hit; one last try in case an entry
                        // landed at the same moment.
                        return Ok(self.pop_front());
                    }
                }
                None => notified.as_mut().await,
            }
            // The notification is consumed; arm a fresh one for the next
            // pass in case another caller took the entry.
            notified.set(self.shared.notify.notified());
        }
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.shared.queue.lock().unwrap().len() as u64)
    }

    async fn peek_range(&self, start: isize, stop: isize) -> Result<Vec<String>> {
        let queue = self.shared.queue.lock().unwrap();
        match range_bounds(start, stop, queue.len()) {
            Some((lo, hi)) => Ok(queue.iter().skip(lo).take(hi - lo + 1).cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn clear(&self) -> Result<()> {
        self.shared.queue.lock().unwrap().clear();
        Ok(())
    }

    async fn dedicated(&self) -> Result<Box<dyn QueueStore>> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl KvCache for MemoryStore {
    async fn kv_set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.shared.kv.insert(key.to_string(), entry);
        Ok(())
    }

    async fn kv_get(&self, key: &str) -> Result<Option<String>> {
        if let Some(entry) = self.shared.kv.get(key) {
            match entry.expires_at {
                Some(at) if Instant::now() >= at => {}
                _ => return Ok(Some(entry.value.clone())),
            }
        }
        // Expired entries are dropped on read.
        self.shared.kv.remove(key);
        Ok(None)
    }
}

/// Resolve LRANGE-style bounds against a queue of `len` entries: negative
/// indices count from the tail, out-of-range ends are clamped, and an
/// empty selection is `None`.
fn range_bounds(start: isize, stop: isize, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
