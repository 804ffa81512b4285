// Behavioral contract for queue store backends, exercised against the
// in-memory implementation. The Redis backend maps each operation onto a
// single list command with the same semantics.

use std::time::Duration;

use hopper_core::config::{QueueBackend, QueueConfig};
use hopper_queue::{MemoryStore, QueueStore};
use tokio::time::{timeout, Instant};

#[tokio::test]
async fn fifo_order_is_preserved() {
    let store = MemoryStore::new();
    for entry in ["first", "second", "third"] {
        store.enqueue(entry).await.unwrap();
    }

    assert_eq!(store.dequeue().await.unwrap().as_deref(), Some("first"));
    assert_eq!(store.dequeue().await.unwrap().as_deref(), Some("second"));
    assert_eq!(store.dequeue().await.unwrap().as_deref(), Some("third"));
    assert_eq!(store.dequeue().await.unwrap(), None);
}

#[tokio::test]
async fn enqueue_reports_resulting_length() {
    let store = MemoryStore::new();
    assert_eq!(store.enqueue("a").await.unwrap(), 1);
    assert_eq!(store.enqueue("b").await.unwrap(), 2);
    assert_eq!(store.enqueue("c").await.unwrap(), 3);

    store.dequeue().await.unwrap();
    assert_eq!(store.enqueue("d").await.unwrap(), 3);
}

#[tokio::test]
async fn peek_is_non_destructive() {
    let store = MemoryStore::new();
    for entry in ["a", "b", "c", "d"] {
        store.enqueue(entry).await.unwrap();
    }

    let head = store.peek_range(0, 1).await.unwrap();
    assert_eq!(head, vec!["a", "b"]);
    // everything, then the last two via negative indices
    assert_eq!(store.peek_range(0, -1).await.unwrap().len(), 4);
    assert_eq!(store.peek_range(-2, -1).await.unwrap(), vec!["c", "d"]);
    // a peek past the end returns what exists
    assert_eq!(store.peek_range(0, 99).await.unwrap().len(), 4);

    assert_eq!(store.len().await.unwrap(), 4);
}

#[tokio::test(start_paused = true)]
async fn empty_timed_wait_elapses_with_none() {
    let store = MemoryStore::new();
    let started = Instant::now();

    let got = store.dequeue_blocking(Duration::from_secs(1)).await.unwrap();

    assert_eq!(got, None);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn timed_wait_picks_up_midway_enqueue() {
    let store = MemoryStore::new();

    let waiter = {
        let store = store.clone();
        tokio::spawn(async move { store.dequeue_blocking(Duration::from_secs(5)).await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    store.enqueue("late arrival").await.unwrap();

    let got = waiter.await.unwrap().unwrap();
    assert_eq!(got.as_deref(), Some("late arrival"));
}

#[tokio::test]
async fn forever_wait_wakes_on_enqueue() {
    let store = MemoryStore::new();

    let waiter = {
        let store = store.clone();
        tokio::spawn(async move { store.dequeue_blocking(Duration::ZERO).await })
    };

    store.enqueue("wake up").await.unwrap();

    let got = timeout(Duration::from_secs(2), waiter)
        .await
        .expect("waiter should wake")
        .unwrap()
        .unwrap();
    assert_eq!(got.as_deref(), Some("wake up"));
}

#[tokio::test]
async fn each_entry_goes_to_one_waiter() {
    let store = MemoryStore::new();

    let mut waiters = Vec::new();
    for _ in 0..2 {
        let store = store.clone();
        waiters.push(tokio::spawn(async move {
            store.dequeue_blocking(Duration::ZERO).await
        }));
    }

    store.enqueue("one").await.unwrap();
    store.enqueue("two").await.unwrap();

    let mut got = Vec::new();
    for waiter in waiters {
        let entry = timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter should wake")
            .unwrap()
            .unwrap()
            .unwrap();
        got.push(entry);
    }
    got.sort();
    assert_eq!(got, vec!["one", "two"]);
}

#[tokio::test]
async fn clear_discards_pending_entries() {
    let store = MemoryStore::new();
    for entry in ["a", "b", "c"] {
        store.enqueue(entry).await.unwrap();
    }

    store.clear().await.unwrap();

    assert_eq!(store.len().await.unwrap(), 0);
    assert_eq!(store.dequeue().await.unwrap(), None);
}

#[tokio::test]
async fn dedicated_handle_shares_the_queue() {
    let store = MemoryStore::new();
    let handle = store.dedicated().await.unwrap();

    store.enqueue("via original").await.unwrap();
    assert_eq!(
        handle.dequeue().await.unwrap().as_deref(),
        Some("via original")
    );
}

mod cache {
    use super::*;
    use hopper_queue::KvCache;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_its_ttl() {
        let store = MemoryStore::new();
        store
            .kv_set("greeting", "hello", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(
            store.kv_get("greeting").await.unwrap().as_deref(),
            Some("hello")
        );

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.kv_get("greeting").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_without_ttl_persists() {
        let store = MemoryStore::new();
        store.kv_set("pinned", "value", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        assert_eq!(
            store.kv_get("pinned").await.unwrap().as_deref(),
            Some("value")
        );
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.kv_get("absent").await.unwrap(), None);
    }
}

#[tokio::test]
async fn factory_wires_the_memory_backend() {
    let config = QueueConfig {
        backend: QueueBackend::Memory,
        ..Default::default()
    };
    let (queue, cache) = hopper_queue::connect(&config).await.unwrap();

    queue.enqueue("through the trait").await.unwrap();
    assert_eq!(queue.len().await.unwrap(), 1);
    assert_eq!(
        queue.dequeue().await.unwrap().as_deref(),
        Some("through the trait")
    );

    cache.kv_set("k", "v", None).await.unwrap();
    assert_eq!(cache.kv_get("k").await.unwrap().as_deref(), Some("v"));
}

/// Round trip against a real server. Run with a local redis and
/// `cargo test -- --ignored`.
#[tokio::test]
#[ignore = "needs a running redis server"]
async fn redis_round_trip() {
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let config = QueueConfig {
        key: format!("hopper_test_{nonce}"),
        ..Default::default()
    };

    let (queue, _cache) = hopper_queue::connect(&config).await.unwrap();
    queue.clear().await.unwrap();

    assert_eq!(queue.enqueue("a").await.unwrap(), 1);
    assert_eq!(queue.enqueue("b").await.unwrap(), 2);
    assert_eq!(queue.peek_range(0, -1).await.unwrap(), vec!["a", "b"]);
    assert_eq!(queue.dequeue().await.unwrap().as_deref(), Some("a"));

    queue.clear().await.unwrap();
    assert_eq!(queue.len().await.unwrap(), 0);
}
