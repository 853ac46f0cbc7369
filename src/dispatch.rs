//! Command dispatch: one user interaction, at most one control request.
//!
//! The dispatcher reads the registry to decide which action a node
//! interaction means, then issues exactly one control request. It never
//! mutates local state: the registry changes only when the confirming
//! `node.started`/`node.stopped` event arrives over the channel, so the
//! displayed state can never diverge from server-confirmed state when a
//! command fails or is rejected.

use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::registry::NodeRegistry;
use crate::transport::{EngineTransport, TransportError};
use crate::workflow::NodeStatus;

/// Outbound control action, the inverse of the node's current status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
}

impl ControlAction {
    /// A started node gets stopped; any other status gets started.
    #[must_use]
    pub fn for_status(status: NodeStatus) -> Self {
        match status {
            NodeStatus::Started => Self::Stop,
            NodeStatus::Stopped => Self::Start,
        }
    }

    /// Path segment of the control endpoint.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("control request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Cheap cloneable handle translating node interactions into control
/// requests. Hand a clone to whatever owns the click surface; there is no
/// global callback.
#[derive(Clone)]
pub struct CommandDispatcher {
    workflow: String,
    registry: Arc<Mutex<NodeRegistry>>,
    transport: Arc<dyn EngineTransport>,
}

impl CommandDispatcher {
    pub fn new(
        workflow: impl Into<String>,
        registry: Arc<Mutex<NodeRegistry>>,
        transport: Arc<dyn EngineTransport>,
    ) -> Self {
        Self {
            workflow: workflow.into(),
            registry,
            transport,
        }
    }

    /// Compute the action an interaction with `node` would issue right now.
    /// `None` for names not in the registry: no request may leave the client
    /// for unknown or stale identifiers.
    pub fn plan(&self, node: &str) -> Option<ControlAction> {
        let registry = self.registry.lock().unwrap();
        registry
            .get(node)
            .map(|entry| ControlAction::for_status(entry.status))
    }

    /// Issue the control request for one interaction with `node`.
    ///
    /// Returns the action that was sent, or `Ok(None)` if the node is
    /// unknown and nothing was sent. The registry lock is released before
    /// the request goes out.
    pub async fn dispatch(&self, node: &str) -> Result<Option<ControlAction>, DispatchError> {
        let Some(action) = self.plan(node) else {
            tracing::debug!(node = %node, "ignoring interaction with unknown node");
            return Ok(None);
        };
        tracing::info!(node = %node, action = %action, "dispatching control command");
        self.transport
            .control_node(&self.workflow, node, action)
            .await?;
        Ok(Some(action))
    }
}
