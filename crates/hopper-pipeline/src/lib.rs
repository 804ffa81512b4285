//! Connection-gated delivery pipeline.
//!
//! A [`Lifecycle`] supervisor watches the client count and runs a fixed
//! pool of consumer workers plus a once-a-second stats emitter exactly
//! while at least one client is connected. Dequeued messages and stats
//! snapshots fan out over a broadcast channel; transports subscribe and
//! forward frames.

pub mod lifecycle;
pub mod stats;
pub mod types;
mod worker;

pub use lifecycle::{ClientGuard, Lifecycle, PipelineHandle};
pub use stats::collect_snapshot;
pub use types::ClientEvent;
