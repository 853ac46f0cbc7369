//! Decoding of tagged event-channel messages.
//!
//! The channel carries JSON envelopes of the form `{event, payload}`. Known
//! kinds decode into the closed [`WorkflowEvent`] union so handling is an
//! exhaustive match; unknown kinds decode to `None` and are dropped by the
//! caller (forward-compatible no-op). A malformed payload on a known kind is
//! a typed error, so the listener can log it and move on without ever letting
//! a bad message stop the channel.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Wire tag for a node transitioning to started.
pub const NODE_STARTED: &str = "node.started";
/// Wire tag for a node transitioning to stopped.
pub const NODE_STOPPED: &str = "node.stopped";
/// Wire tag for a batch of positional stat values.
pub const STATS: &str = "stats";

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One positional stat value carried by a `stats` event.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct StatUpdate {
    pub value: f64,
}

/// A recognized event-channel message.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowEvent {
    NodeStarted(String),
    NodeStopped(String),
    Stats { name: String, stats: Vec<StatUpdate> },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct StatsPayload {
    name: String,
    #[serde(default)]
    stats: Vec<StatUpdate>,
}

impl WorkflowEvent {
    /// Decode a raw channel message.
    ///
    /// Returns `Ok(None)` for event kinds this client does not recognize.
    ///
    /// # Examples
    ///
    /// ```
    /// use loomview::events::WorkflowEvent;
    /// use serde_json::json;
    ///
    /// let event = WorkflowEvent::decode(&json!({"event": "node.started", "payload": "demuxer"}))
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(event, WorkflowEvent::NodeStarted("demuxer".into()));
    ///
    /// let unknown = WorkflowEvent::decode(&json!({"event": "node.renamed", "payload": "x"})).unwrap();
    /// assert!(unknown.is_none());
    /// ```
    pub fn decode(raw: &Value) -> Result<Option<Self>, EventDecodeError> {
        let envelope: Envelope =
            serde_json::from_value(raw.clone()).map_err(EventDecodeError::Envelope)?;
        match envelope.event.as_str() {
            NODE_STARTED => {
                let name = decode_payload::<String>(NODE_STARTED, envelope.payload)?;
                Ok(Some(Self::NodeStarted(name)))
            }
            NODE_STOPPED => {
                let name = decode_payload::<String>(NODE_STOPPED, envelope.payload)?;
                Ok(Some(Self::NodeStopped(name)))
            }
            STATS => {
                let payload = decode_payload::<StatsPayload>(STATS, envelope.payload)?;
                Ok(Some(Self::Stats {
                    name: payload.name,
                    stats: payload.stats,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Name of the node this event refers to.
    pub fn node_name(&self) -> &str {
        match self {
            Self::NodeStarted(name) | Self::NodeStopped(name) => name,
            Self::Stats { name, .. } => name,
        }
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    payload: Value,
) -> Result<T, EventDecodeError> {
    serde_json::from_value(payload).map_err(|source| EventDecodeError::Payload { kind, source })
}
