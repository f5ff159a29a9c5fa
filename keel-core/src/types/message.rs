//! Messages posted to a worker by its clients.

use serde::{Deserialize, Serialize};

/// A recognised client message.
///
/// Messages are JSON objects discriminated by their `type` field, e.g.
/// `{"type": "SKIP_WAITING"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate a waiting worker without waiting for old clients to close.
    SkipWaiting,
}

impl WorkerMessage {
    /// Parses a message payload.
    ///
    /// Payloads that are not objects, lack a `type`, or carry an unknown
    /// type yield `None`; the worker ignores them.
    pub fn parse(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}
