//! Workflow aggregate and wire types for the snapshot payload.
//!
//! These types mirror the engine's snapshot body exactly:
//!
//! ```json
//! {
//!   "nodes": [{"name": "...", "label": "...", "status": "started",
//!              "stats": [{"label": "...", "unit": "..."}]}],
//!   "edges": [{"from": "...", "to": "..."}],
//!   "job": { ... }
//! }
//! ```
//!
//! The workflow name is not part of the body; it comes from the request path
//! and is injected by the transport after decoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime status of a workflow node as reported by the engine.
///
/// The wire form is lowercase (`"started"` / `"stopped"`), both in the
/// snapshot body and in the class names the render surface toggles.
///
/// # Examples
///
/// ```
/// use loomview::workflow::NodeStatus;
///
/// let status: NodeStatus = serde_json::from_str("\"started\"").unwrap();
/// assert!(status.is_started());
/// assert_eq!(status.as_class(), "started");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Started,
    Stopped,
}

impl NodeStatus {
    /// Returns `true` if the node is currently running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }

    /// Class name applied to the rendered node element for this status.
    #[must_use]
    pub fn as_class(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
        }
    }

    /// The class name of the opposite status, removed on every toggle.
    #[must_use]
    pub fn opposite_class(&self) -> &'static str {
        match self {
            Self::Started => "stopped",
            Self::Stopped => "started",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_class())
    }
}

/// Snapshot-time binding of one stat row: display label and unit.
///
/// Stat values are not part of the snapshot; they arrive exclusively through
/// `stats` events and are matched to these bindings by position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSpec {
    pub label: String,
    pub unit: String,
}

/// One workflow node as declared by the snapshot.
///
/// Nodes are created at snapshot load and never deleted during a session;
/// only their status and stat values change afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique name, used as the element identifier on the render surface and
    /// as the path segment of control requests.
    pub name: String,
    /// Display text.
    pub label: String,
    pub status: NodeStatus,
    #[serde(default)]
    pub stats: Vec<StatSpec>,
}

/// Directed dependency between two nodes. Purely structural; carries no
/// runtime state and never changes after snapshot load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// The full workflow aggregate returned by the snapshot fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Session-scoped identifier namespacing all subsequent requests.
    /// Injected from the request path, not the response body.
    #[serde(skip)]
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Opaque job metadata, passed through verbatim for display.
    #[serde(default)]
    pub job: serde_json::Value,
}

impl Workflow {
    /// Look up a node declaration by name.
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| node.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_body_decodes() {
        let body = json!({
            "nodes": [
                {"name": "demuxer", "label": "Demuxer", "status": "started",
                 "stats": [{"label": "fps", "unit": "f/s"}]},
                {"name": "encoder", "label": "Encoder", "status": "stopped"},
            ],
            "edges": [{"from": "demuxer", "to": "encoder"}],
            "job": {"input": "rtmp://in"},
        });

        let workflow: Workflow = serde_json::from_value(body).unwrap();
        assert_eq!(workflow.name, "");
        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.nodes[0].stats.len(), 1);
        assert!(workflow.nodes[0].status.is_started());
        assert!(workflow.nodes[1].stats.is_empty());
        assert_eq!(workflow.edges[0].from, "demuxer");
        assert_eq!(workflow.job["input"], "rtmp://in");
        assert_eq!(workflow.node("encoder").unwrap().label, "Encoder");
        assert!(workflow.node("missing").is_none());
    }

    #[test]
    fn status_classes_are_paired() {
        assert_eq!(NodeStatus::Started.as_class(), "started");
        assert_eq!(NodeStatus::Started.opposite_class(), "stopped");
        assert_eq!(NodeStatus::Stopped.as_class(), "stopped");
        assert_eq!(NodeStatus::Stopped.opposite_class(), "started");
        assert_eq!(NodeStatus::Stopped.to_string(), "stopped");
    }
}
