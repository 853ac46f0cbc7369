//! One-shot snapshot load of the workflow definition.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::transport::{EngineTransport, TransportError};
use crate::workflow::Workflow;

/// Fetches the full workflow aggregate once at session start.
///
/// All-or-nothing: on any transport or server error the caller receives no
/// partially-initialized aggregate. There is no retry; a failed load is
/// terminal for the session until the user reconnects.
pub struct SnapshotLoader {
    transport: Arc<dyn EngineTransport>,
}

impl SnapshotLoader {
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the workflow named `name`.
    pub async fn load(&self, name: &str) -> Result<Workflow, TransportError> {
        let workflow = self.transport.fetch_workflow(name).await?;
        tracing::info!(
            workflow = %workflow.name,
            nodes = workflow.nodes.len(),
            edges = workflow.edges.len(),
            "snapshot loaded"
        );
        check_structure(&workflow);
        Ok(workflow)
    }
}

// Structural sanity only. The engine is authoritative, so oddities are
// logged and tolerated, never fatal.
fn check_structure(workflow: &Workflow) {
    let known: FxHashSet<&str> = workflow.nodes.iter().map(|node| node.name.as_str()).collect();
    for edge in &workflow.edges {
        if !known.contains(edge.from.as_str()) || !known.contains(edge.to.as_str()) {
            tracing::warn!(
                from = %edge.from,
                to = %edge.to,
                "snapshot edge references a node it never declares"
            );
        }
    }
}
