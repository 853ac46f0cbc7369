//! The node registry: canonical in-memory table of per-node runtime state.
//!
//! The registry is the single source of truth for node status and stat values.
//! The render surface is a pure projection of it, never a second store. Three
//! collaborators touch it with distinct rights:
//!
//! - the snapshot load populates it exactly once,
//! - the event reconciler mutates status and stat values continuously,
//! - the command dispatcher and render projector only read.
//!
//! Mutations are idempotent and total: applying the same status or stat value
//! twice leaves the same observable state, and referential misses (unknown
//! node, out-of-range stat index) are ordinary [`Applied`] outcomes rather
//! than errors, because events may race ahead of or behind a still-loading
//! snapshot.
//!
//! # Examples
//!
//! ```
//! use loomview::registry::{Applied, NodeRegistry};
//! use loomview::workflow::{NodeStatus, Workflow};
//! use serde_json::json;
//!
//! let workflow: Workflow = serde_json::from_value(json!({
//!     "nodes": [{"name": "demuxer", "label": "Demuxer", "status": "stopped",
//!                "stats": [{"label": "fps", "unit": "f/s"}]}],
//!     "edges": [],
//! }))
//! .unwrap();
//!
//! let mut registry = NodeRegistry::new();
//! registry.populate(&workflow).unwrap();
//!
//! assert_eq!(registry.set_status("demuxer", NodeStatus::Started), Applied::Ok);
//! assert_eq!(registry.set_stat("demuxer", 0, 25.0), Applied::Ok);
//! assert_eq!(registry.set_stat("demuxer", 7, 25.0), Applied::OutOfRange);
//! assert_eq!(registry.set_status("ghost", NodeStatus::Started), Applied::UnknownNode);
//! ```

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::workflow::{NodeStatus, Workflow};

/// One stat slot of a node: the snapshot-time binding plus the latest value
/// received over the event channel (`None` until the first `stats` event).
#[derive(Clone, Debug, PartialEq)]
pub struct StatBinding {
    pub label: String,
    pub unit: String,
    pub value: Option<f64>,
}

/// Runtime state held for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeEntry {
    pub label: String,
    pub status: NodeStatus,
    /// Positional stat slots; the length is fixed at snapshot time.
    pub stats: Vec<StatBinding>,
}

impl NodeEntry {
    /// Latest value of stat slot `index`, if the slot exists and has received
    /// a value.
    pub fn stat_value(&self, index: usize) -> Option<f64> {
        self.stats.get(index).and_then(|slot| slot.value)
    }
}

/// Outcome of a registry mutation. The non-`Ok` variants are valid inputs
/// with a no-op result, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The mutation took effect.
    Ok,
    /// The named node is not in the registry.
    UnknownNode,
    /// The stat index is past the node's slot count. Slots never resize.
    OutOfRange,
}

impl Applied {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Errors violating the registry's lifecycle contract.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// [`NodeRegistry::populate`] was called on an already-populated registry.
    /// Population happens exactly once per session.
    #[error("node registry is already populated")]
    AlreadyPopulated,
}

/// The canonical table of node identity → runtime state.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: FxHashMap<String, NodeEntry>,
    populated: bool,
}

impl NodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the one-shot population has happened.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Populate the registry from a freshly loaded snapshot. Exactly once per
    /// session; later calls are rejected so no update source can clobber the
    /// canonical table with a second full state.
    ///
    /// Duplicate node names keep the later definition, matching the engine's
    /// own last-write behavior, and are logged as a warning.
    pub fn populate(&mut self, workflow: &Workflow) -> Result<(), RegistryError> {
        if self.populated {
            return Err(RegistryError::AlreadyPopulated);
        }
        self.nodes.reserve(workflow.nodes.len());
        for node in &workflow.nodes {
            let entry = NodeEntry {
                label: node.label.clone(),
                status: node.status,
                stats: node
                    .stats
                    .iter()
                    .map(|stat| StatBinding {
                        label: stat.label.clone(),
                        unit: stat.unit.clone(),
                        value: None,
                    })
                    .collect(),
            };
            if self.nodes.insert(node.name.clone(), entry).is_some() {
                tracing::warn!(node = %node.name, "duplicate node in snapshot, keeping later definition");
            }
        }
        self.populated = true;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NodeEntry> {
        self.nodes.get(name)
    }

    /// Set a node's status. Idempotent; unknown names are ignored.
    pub fn set_status(&mut self, name: &str, status: NodeStatus) -> Applied {
        match self.nodes.get_mut(name) {
            Some(entry) => {
                entry.status = status;
                Applied::Ok
            }
            None => Applied::UnknownNode,
        }
    }

    /// Set the value of stat slot `index` on a node. Idempotent; unknown
    /// names and out-of-range indices are ignored without resizing.
    pub fn set_stat(&mut self, name: &str, index: usize, value: f64) -> Applied {
        let Some(entry) = self.nodes.get_mut(name) else {
            return Applied::UnknownNode;
        };
        let Some(slot) = entry.stats.get_mut(index) else {
            return Applied::OutOfRange;
        };
        slot.value = Some(value);
        Applied::Ok
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
