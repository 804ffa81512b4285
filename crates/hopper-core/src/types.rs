use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Shared monotonic counter (produced-count, consumed-count, client-count).
///
/// Clones share the same cell. Process-local only — nothing here is
/// synchronized across processes or persisted, so counters restart at 0
/// with the process. Relaxed ordering: the values are advisory stats and
/// never guard other memory.
#[derive(Clone, Debug, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Increment by one and return the new value.
    pub fn incr(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement by one, stopping at zero, and return the new value.
    pub fn decr(&self) -> u64 {
        self.0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                n.checked_sub(1)
            })
            .map(|prev| prev - 1)
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incr_returns_new_value() {
        let c = Counter::new();
        assert_eq!(c.incr(), 1);
        assert_eq!(c.incr(), 2);
        assert_eq!(c.get(), 2);
    }

    #[test]
    fn decr_saturates_at_zero() {
        let c = Counter::new();
        assert_eq!(c.decr(), 0);
        c.incr();
        assert_eq!(c.decr(), 0);
    }

    #[test]
    fn clones_share_the_cell() {
        let a = Counter::new();
        let b = a.clone();
        a.incr();
        assert_eq!(b.get(), 1);
        b.reset();
        assert_eq!(a.get(), 0);
    }
}
