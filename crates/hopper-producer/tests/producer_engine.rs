use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};

use hopper_core::config::ProducerConfig;
use hopper_core::message::Message;
use hopper_core::types::Counter;
use hopper_producer::ProducerEngine;
use hopper_queue::{MemoryStore, QueueStore, StoreError};

/// Store wrapper that rejects the first `failures_left` enqueues, then
/// behaves normally.
struct FailingStore {
    inner: MemoryStore,
    failures_left: AtomicU64,
    attempts: AtomicU64,
}

impl FailingStore {
    fn new(failures: u64) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures_left: AtomicU64::new(failures),
            attempts: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl QueueStore for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn enqueue(&self, entry: &str) -> hopper_queue::Result<u64> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let had_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if had_failure {
            return Err(StoreError::Unavailable("injected outage".into()));
        }
        self.inner.enqueue(entry).await
    }

    async fn dequeue(&self) -> hopper_queue::Result<Option<String>> {
        self.inner.dequeue().await
    }

    async fn dequeue_blocking(&self, t: Duration) -> hopper_queue::Result<Option<String>> {
        self.inner.dequeue_blocking(t).await
    }

    async fn len(&self) -> hopper_queue::Result<u64> {
        self.inner.len().await
    }

    async fn peek_range(&self, start: isize, stop: isize) -> hopper_queue::Result<Vec<String>> {
        self.inner.peek_range(start, stop).await
    }

    async fn clear(&self) -> hopper_queue::Result<()> {
        self.inner.clear().await
    }

    async fn dedicated(&self) -> hopper_queue::Result<Box<dyn QueueStore>> {
        self.inner.dedicated().await
    }
}

async fn decoded_ids(store: &dyn QueueStore) -> Vec<u64> {
    store
        .peek_range(0, -1)
        .await
        .unwrap()
        .iter()
        .map(|raw| Message::decode(raw).unwrap().id)
        .collect()
}

#[tokio::test]
async fn ids_are_sequential_from_one() {
    let store: Arc<dyn QueueStore> = Arc::new(MemoryStore::new());
    let config = ProducerConfig { interval_ms: 1 };
    let (engine, handle) = ProducerEngine::new(store.clone(), config, Counter::new());

    let task = tokio::spawn(engine.run());
    for _ in 0..500 {
        if handle.produced() >= 5 {
            break;
        }
        sleep(Duration::from_millis(5)).await;
    }
    handle.stop();
    timeout(Duration::from_secs(2), task)
        .await
        .expect("producer should stop")
        .unwrap();

    let produced = handle.produced();
    assert!(produced >= 5, "only {produced} messages produced");

    let ids = decoded_ids(store.as_ref()).await;
    assert_eq!(ids.len() as u64, produced);
    let expected: Vec<u64> = (1..=produced).collect();
    assert_eq!(ids, expected);
}

#[tokio::test(start_paused = true)]
async fn failed_enqueue_retries_the_same_id() {
    let failing = Arc::new(FailingStore::new(1));
    let store: Arc<dyn QueueStore> = failing.clone();
    let config = ProducerConfig { interval_ms: 50 };
    let (engine, handle) = ProducerEngine::new(store.clone(), config, Counter::new());

    let task = tokio::spawn(engine.run());
    timeout(Duration::from_secs(60), async {
        while handle.produced() < 2 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("producer should recover from the outage");
    handle.stop();
    task.await.unwrap();

    let produced = handle.produced();
    let ids = decoded_ids(store.as_ref()).await;

    // The first attempt failed, so id 1 went out on the retry and the
    // sequence has no hole.
    let expected: Vec<u64> = (1..=produced).collect();
    assert_eq!(ids, expected);
    assert_eq!(failing.attempts.load(Ordering::SeqCst), produced + 1);
}

#[tokio::test]
async fn flat_out_production_stays_responsive_to_stop() {
    let store: Arc<dyn QueueStore> = Arc::new(MemoryStore::new());
    let config = ProducerConfig { interval_ms: 0 };
    let (engine, handle) = ProducerEngine::new(store.clone(), config, Counter::new());

    let task = tokio::spawn(engine.run());
    sleep(Duration::from_millis(10)).await;
    handle.stop();

    timeout(Duration::from_secs(2), task)
        .await
        .expect("flat-out producer should stop promptly")
        .unwrap();
    assert!(handle.produced() > 0);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let store: Arc<dyn QueueStore> = Arc::new(MemoryStore::new());
    let config = ProducerConfig { interval_ms: 50 };
    let (engine, handle) = ProducerEngine::new(store, config, Counter::new());

    let task = tokio::spawn(engine.run());
    handle.stop();
    handle.stop();

    timeout(Duration::from_secs(2), task)
        .await
        .expect("producer should stop")
        .unwrap();

    let after = handle.produced();
    handle.stop();
    assert_eq!(handle.produced(), after);
}

#[tokio::test]
async fn stop_before_run_produces_nothing() {
    let store: Arc<dyn QueueStore> = Arc::new(MemoryStore::new());
    let (engine, handle) = ProducerEngine::new(store.clone(), ProducerConfig::default(), Counter::new());

    handle.stop();
    engine.run().await;

    assert_eq!(handle.produced(), 0);
    assert_eq!(store.len().await.unwrap(), 0);
}
