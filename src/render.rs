//! Render-surface boundary and pure projection of canonical state.
//!
//! The layout engine and page chrome live outside this crate; they are
//! reached through [`RenderSurface`], a narrow side-effect boundary. The
//! surface never stores state of its own: everything it displays is a
//! projection of the node registry, so there is exactly one source of truth.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::registry::NodeRegistry;
use crate::workflow::{NodeStatus, Workflow};

/// Format a stat value for display. Values are always shown with exactly two
/// decimal places.
#[must_use]
pub fn format_stat(value: f64) -> String {
    format!("{value:.2}")
}

/// Side-effect boundary to the rendered page.
///
/// Each node is addressable by its name; each node's stat rows are
/// addressable by position, in snapshot order. Implementations decide how the
/// calls translate to an actual display (DOM updates, terminal redraw, ...).
pub trait RenderSurface: Send + Sync {
    /// Replace the rendered graph with a fresh projection.
    fn draw(&mut self, description: &GraphDescription);

    /// Toggle a node's status class: remove the opposite-state class, add the
    /// matching one.
    fn apply_status(&mut self, node: &str, status: NodeStatus);

    /// Write a formatted value into stat row `index` of a node.
    fn set_stat_text(&mut self, node: &str, index: usize, text: &str);

    /// Show or hide the page-level busy indicator.
    fn set_busy(&mut self, busy: bool);

    /// Uniform error display used for snapshot-load and command failures.
    fn show_error(&mut self, message: &str);

    /// Display the opaque job metadata verbatim.
    fn show_job(&mut self, job: &Value);
}

/// A render surface shared between the session and the reconciler task.
pub type SharedSurface = Arc<Mutex<Box<dyn RenderSurface>>>;

/// Wrap a surface for sharing.
pub fn shared_surface<S: RenderSurface + 'static>(surface: S) -> SharedSurface {
    Arc::new(Mutex::new(Box::new(surface)))
}

// ============================================================================
// Projection
// ============================================================================

/// One stat row of a projected node.
#[derive(Clone, Debug, PartialEq)]
pub struct StatRow {
    pub label: String,
    pub unit: String,
    /// Formatted value, absent until the first `stats` event for this slot.
    pub value: Option<String>,
}

/// One projected node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDescription {
    pub name: String,
    pub label: String,
    pub class: &'static str,
    pub stat_rows: Vec<StatRow>,
}

/// Graph description consumed by the layout collaborator.
///
/// Topology (node order, edges) comes from the workflow aggregate; status and
/// stat values come from the registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphDescription {
    pub nodes: Vec<NodeDescription>,
    pub edges: Vec<(String, String)>,
}

impl GraphDescription {
    /// Project the current canonical state into a drawable description.
    ///
    /// Nodes present in the workflow but missing from the registry (which
    /// cannot happen after a normal populate) fall back to their snapshot
    /// declaration, so the projection is total.
    #[must_use]
    pub fn project(workflow: &Workflow, registry: &NodeRegistry) -> Self {
        let nodes = workflow
            .nodes
            .iter()
            .map(|spec| match registry.get(&spec.name) {
                Some(entry) => NodeDescription {
                    name: spec.name.clone(),
                    label: entry.label.clone(),
                    class: entry.status.as_class(),
                    stat_rows: entry
                        .stats
                        .iter()
                        .map(|slot| StatRow {
                            label: slot.label.clone(),
                            unit: slot.unit.clone(),
                            value: slot.value.map(format_stat),
                        })
                        .collect(),
                },
                None => NodeDescription {
                    name: spec.name.clone(),
                    label: spec.label.clone(),
                    class: spec.status.as_class(),
                    stat_rows: spec
                        .stats
                        .iter()
                        .map(|stat| StatRow {
                            label: stat.label.clone(),
                            unit: stat.unit.clone(),
                            value: None,
                        })
                        .collect(),
                },
            })
            .collect();

        let edges = workflow
            .edges
            .iter()
            .map(|edge| (edge.from.clone(), edge.to.clone()))
            .collect();

        Self { nodes, edges }
    }

    /// Render the `graph TB` description text the layout engine consumes:
    /// one declaration and one class line per node, one arrow per edge.
    #[must_use]
    pub fn to_mermaid(&self) -> String {
        let mut desc = String::from("graph TB\n");
        for node in &self.nodes {
            let mut label = node.label.clone();
            for row in &node.stat_rows {
                let value = row.value.as_deref().unwrap_or("-");
                label.push_str(&format!("<br>{}: {} {}", row.label, value, row.unit));
            }
            desc.push_str(&format!("    {}(\"{}\")\n", node.name, label));
            desc.push_str(&format!("    class {} {};\n", node.name, node.class));
        }
        for (from, to) in &self.edges {
            desc.push_str(&format!("    {from}-->{to}\n"));
        }
        desc
    }
}

// ============================================================================
// Surfaces
// ============================================================================

/// Surface that reports every projection side effect through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSurface;

impl RenderSurface for LogSurface {
    fn draw(&mut self, description: &GraphDescription) {
        tracing::info!(
            nodes = description.nodes.len(),
            edges = description.edges.len(),
            "drawing graph"
        );
    }

    fn apply_status(&mut self, node: &str, status: NodeStatus) {
        tracing::info!(node = %node, status = %status, "node status changed");
    }

    fn set_stat_text(&mut self, node: &str, index: usize, text: &str) {
        tracing::debug!(node = %node, index, value = %text, "stat updated");
    }

    fn set_busy(&mut self, busy: bool) {
        tracing::debug!(busy, "busy indicator");
    }

    fn show_error(&mut self, message: &str) {
        tracing::error!(%message, "displaying error");
    }

    fn show_job(&mut self, job: &Value) {
        tracing::info!(job = %job, "job metadata");
    }
}

/// Everything a [`MemorySurface`] can record.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Draw(GraphDescription),
    Status { node: String, class: &'static str },
    StatText { node: String, index: usize, text: String },
    Busy(bool),
    Error(String),
    Job(Value),
}

/// In-memory surface for tests and snapshots. Clones share the same call log.
#[derive(Clone, Default)]
pub struct MemorySurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all recorded calls.
    pub fn snapshot(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear the call log.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RenderSurface for MemorySurface {
    fn draw(&mut self, description: &GraphDescription) {
        self.record(SurfaceCall::Draw(description.clone()));
    }

    fn apply_status(&mut self, node: &str, status: NodeStatus) {
        self.record(SurfaceCall::Status {
            node: node.to_string(),
            class: status.as_class(),
        });
    }

    fn set_stat_text(&mut self, node: &str, index: usize, text: &str) {
        self.record(SurfaceCall::StatText {
            node: node.to_string(),
            index,
            text: text.to_string(),
        });
    }

    fn set_busy(&mut self, busy: bool) {
        self.record(SurfaceCall::Busy(busy));
    }

    fn show_error(&mut self, message: &str) {
        self.record(SurfaceCall::Error(message.to_string()));
    }

    fn show_job(&mut self, job: &Value) {
        self.record(SurfaceCall::Job(job.clone()));
    }
}
