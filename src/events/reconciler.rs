//! Applies decoded events to the node registry, in strict arrival order.
//!
//! The reconciler is the only writer of node state after the snapshot
//! populate. Each [`apply`](Reconciler::apply) call runs to completion before
//! the listener hands over the next event, so no two handlers ever interleave
//! against the registry. Referential misses are silent drops: events may race
//! ahead of a still-loading snapshot, and that race is benign by design.

use std::sync::{Arc, Mutex};

use crate::registry::{Applied, NodeRegistry};
use crate::render::{format_stat, SharedSurface};
use crate::workflow::NodeStatus;

use super::envelope::{StatUpdate, WorkflowEvent};

/// What applying one event did to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A status change was recorded and projected.
    StatusApplied(NodeStatus),
    /// Number of stat slots updated; entries past the slot count were
    /// dropped (deliberate truncation, not an error).
    StatsApplied(usize),
    /// The event referenced a node the snapshot never declared.
    UnknownNode,
}

/// Consumes the ordered event channel and keeps registry and render surface
/// in sync.
pub struct Reconciler {
    registry: Arc<Mutex<NodeRegistry>>,
    surface: SharedSurface,
}

impl Reconciler {
    pub fn new(registry: Arc<Mutex<NodeRegistry>>, surface: SharedSurface) -> Self {
        Self { registry, surface }
    }

    /// Apply one event. Total over its input domain: absent nodes and
    /// out-of-range stat indices are no-ops, never failures.
    pub fn apply(&self, event: &WorkflowEvent) -> ReconcileOutcome {
        match event {
            WorkflowEvent::NodeStarted(name) => self.apply_status(name, NodeStatus::Started),
            WorkflowEvent::NodeStopped(name) => self.apply_status(name, NodeStatus::Stopped),
            WorkflowEvent::Stats { name, stats } => self.apply_stats(name, stats),
        }
    }

    fn apply_status(&self, name: &str, status: NodeStatus) -> ReconcileOutcome {
        let mut registry = self.registry.lock().unwrap();
        match registry.set_status(name, status) {
            Applied::Ok => {
                self.surface.lock().unwrap().apply_status(name, status);
                ReconcileOutcome::StatusApplied(status)
            }
            _ => {
                tracing::debug!(node = %name, "dropping status event for unknown node");
                ReconcileOutcome::UnknownNode
            }
        }
    }

    fn apply_stats(&self, name: &str, stats: &[StatUpdate]) -> ReconcileOutcome {
        let mut registry = self.registry.lock().unwrap();
        if registry.get(name).is_none() {
            tracing::debug!(node = %name, "dropping stats event for unknown node");
            return ReconcileOutcome::UnknownNode;
        }
        let mut surface = self.surface.lock().unwrap();
        let mut updated = 0;
        for (index, stat) in stats.iter().enumerate() {
            // Positional identity: nothing exists past the slot count.
            match registry.set_stat(name, index, stat.value) {
                Applied::Ok => {
                    surface.set_stat_text(name, index, &format_stat(stat.value));
                    updated += 1;
                }
                _ => break,
            }
        }
        ReconcileOutcome::StatsApplied(updated)
    }
}
