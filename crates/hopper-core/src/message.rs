use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single queued message.
///
/// This is the unit that travels the whole pipeline: produced, serialized
/// into the store, dequeued, and fanned out to clients. Field names are
/// camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Sequence number assigned by the producer, starting at 1.
    pub id: u64,
    /// Creation time, RFC 3339 with millisecond precision.
    pub timestamp: String,
    /// Human-readable body, e.g. "Message 42".
    pub data: String,
    /// Randomly picked HTML color name.
    pub color: String,
    /// Nearest primary color to `color` by RGB distance.
    pub primary_color: String,
}

impl Message {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Point-in-time view of the queue, emitted once per second while the
/// pipeline is active and served on demand over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Entries currently waiting in the store.
    pub queue_length: u64,
    /// Messages delivered to clients since the pipeline last activated.
    pub consumed_count: u64,
    /// Messages enqueued since the process started.
    pub produced_count: u64,
    /// Up to the five oldest undelivered messages, oldest first.
    pub recent_messages: Vec<Message>,
    /// When this snapshot was taken.
    pub timestamp: String,
}

/// Current time in the wire timestamp format.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
