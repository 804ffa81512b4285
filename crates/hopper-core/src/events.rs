use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Message, StatsSnapshot};

pub const EVENT_QUEUE_MESSAGE: &str = "queueMessage";
pub const EVENT_QUEUE_STATS: &str = "queueStats";

/// An event fanned out to every connected client.
///
/// On the wire this is an envelope of the form
/// `{"event": "<name>", "payload": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum QueueEvent {
    /// A message was dequeued and is being delivered.
    QueueMessage(Message),
    /// Periodic queue statistics.
    QueueStats(StatsSnapshot),
}

impl QueueEvent {
    /// The event name clients subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::QueueMessage(_) => EVENT_QUEUE_MESSAGE,
            QueueEvent::QueueStats(_) => EVENT_QUEUE_STATS,
        }
    }

    /// Serialize into the client-facing envelope.
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize just the payload, for transports that carry the event
    /// name out of band (SSE named events).
    pub fn payload_json(&self) -> Result<String> {
        match self {
            QueueEvent::QueueMessage(message) => Ok(serde_json::to_string(message)?),
            QueueEvent::QueueStats(snapshot) => Ok(serde_json::to_string(snapshot)?),
        }
    }
}
