//! Continuous message producer.
//!
//! Generates numbered, color-tagged messages and appends them to the
//! queue store for as long as the process runs. Store failures are
//! retried with the same id after a short backoff, so the delivered
//! sequence stays gap-free.

pub mod engine;

pub use engine::{ProducerEngine, ProducerHandle};
