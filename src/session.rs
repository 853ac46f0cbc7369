//! Session lifecycle: snapshot load, reconciler listener, command dispatch.
//!
//! A [`WorkflowSession`] owns the node registry for its whole lifetime and
//! wires the three update paths together:
//!
//! 1. the snapshot load populates the registry exactly once,
//! 2. a background listener task drains the event channel through the
//!    [`Reconciler`](crate::events::Reconciler), one event at a time,
//! 3. [`dispatch`](WorkflowSession::dispatch) turns a node interaction into a
//!    single control request, with the confirming event closing the loop.
//!
//! The listener starts *before* the snapshot fetch. Snapshot completion and
//! event arrival are deliberately unordered; events that race ahead of the
//! snapshot land on an empty registry and drop silently, which is the
//! compensating mechanism for that race.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task;

use crate::config::ClientConfig;
use crate::dispatch::{CommandDispatcher, ControlAction, DispatchError};
use crate::events::{Reconciler, WorkflowEvent};
use crate::registry::{NodeRegistry, RegistryError};
use crate::render::{GraphDescription, SharedSurface};
use crate::snapshot::SnapshotLoader;
use crate::transport::{EngineTransport, TransportError};
use crate::workflow::{NodeStatus, Workflow};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The snapshot fetch failed; the session was not constructed and the
    /// registry was never populated.
    #[error("snapshot load failed: {0}")]
    SnapshotLoad(#[from] TransportError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}

/// A live view session over one workflow.
pub struct WorkflowSession {
    workflow: Workflow,
    registry: Arc<Mutex<NodeRegistry>>,
    dispatcher: CommandDispatcher,
    surface: SharedSurface,
    listener: Option<ListenerState>,
}

impl WorkflowSession {
    /// Connect to the engine: start reconciling the event channel, fetch the
    /// snapshot, populate the registry, draw the initial projection and job.
    ///
    /// On snapshot failure the error is shown through the surface's uniform
    /// error display, the listener is torn down, and no session exists, so
    /// downstream consumers never observe a partially-initialized view.
    pub async fn connect(
        config: &ClientConfig,
        transport: Arc<dyn EngineTransport>,
        surface: SharedSurface,
        events: flume::Receiver<serde_json::Value>,
    ) -> Result<Self, SessionError> {
        let registry = Arc::new(Mutex::new(NodeRegistry::new()));
        let listener = Self::spawn_listener(Arc::clone(&registry), Arc::clone(&surface), events);

        match Self::initialize(config, &transport, &registry, &surface).await {
            Ok(workflow) => {
                let dispatcher = CommandDispatcher::new(
                    workflow.name.clone(),
                    Arc::clone(&registry),
                    transport,
                );
                Ok(Self {
                    workflow,
                    registry,
                    dispatcher,
                    surface,
                    listener: Some(listener),
                })
            }
            Err(err) => {
                Self::stop(listener).await;
                Err(err)
            }
        }
    }

    async fn initialize(
        config: &ClientConfig,
        transport: &Arc<dyn EngineTransport>,
        registry: &Arc<Mutex<NodeRegistry>>,
        surface: &SharedSurface,
    ) -> Result<Workflow, SessionError> {
        surface.lock().unwrap().set_busy(true);

        let loader = SnapshotLoader::new(Arc::clone(transport));
        let workflow = match loader.load(&config.workflow).await {
            Ok(workflow) => workflow,
            Err(err) => {
                let mut surface = surface.lock().unwrap();
                surface.show_error(&err.to_string());
                surface.set_busy(false);
                return Err(err.into());
            }
        };

        {
            let mut registry = registry.lock().unwrap();
            if let Err(err) = registry.populate(&workflow) {
                let mut surface = surface.lock().unwrap();
                surface.show_error(&err.to_string());
                surface.set_busy(false);
                return Err(err.into());
            }
            let description = GraphDescription::project(&workflow, &registry);
            let mut surface = surface.lock().unwrap();
            surface.draw(&description);
            surface.show_job(&workflow.job);
            surface.set_busy(false);
        }

        Ok(workflow)
    }

    /// Spawn the listener task draining the event channel. Events are decoded
    /// and applied strictly in arrival order; each handler runs to completion
    /// before the next event is taken.
    fn spawn_listener(
        registry: Arc<Mutex<NodeRegistry>>,
        surface: SharedSurface,
        events: flume::Receiver<serde_json::Value>,
    ) -> ListenerState {
        let reconciler = Reconciler::new(registry, surface);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = events.recv_async() => match recv {
                        // Channel closed: the feed is gone, the view stays at
                        // the last server-confirmed state.
                        Err(_) => break,
                        Ok(raw) => match WorkflowEvent::decode(&raw) {
                            Ok(Some(event)) => {
                                reconciler.apply(&event);
                            }
                            Ok(None) => {
                                tracing::debug!("ignoring unrecognized event kind");
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "dropping malformed event");
                            }
                        },
                    },
                }
            }
        });

        ListenerState {
            shutdown_tx,
            handle,
        }
    }

    async fn stop(state: ListenerState) {
        let _ = state.shutdown_tx.send(());
        let _ = state.handle.await;
    }

    /// The loaded workflow aggregate (topology and job metadata).
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Shared handle to the canonical registry (read-only by convention for
    /// everything except the reconciler).
    pub fn registry(&self) -> Arc<Mutex<NodeRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Current status of a node, if the snapshot declared it.
    pub fn status_of(&self, node: &str) -> Option<NodeStatus> {
        self.registry
            .lock()
            .unwrap()
            .get(node)
            .map(|entry| entry.status)
    }

    /// Project the current canonical state into a drawable description.
    pub fn project(&self) -> GraphDescription {
        let registry = self.registry.lock().unwrap();
        GraphDescription::project(&self.workflow, &registry)
    }

    /// Cloneable dispatcher handle for whatever owns the click surface.
    pub fn dispatcher(&self) -> CommandDispatcher {
        self.dispatcher.clone()
    }

    /// Handle one node interaction: issue the inverse-of-status command with
    /// the busy indicator shown for the duration of the request.
    ///
    /// Unknown names are a complete no-op, busy indicator included. Local
    /// state is never touched; a failure is shown through the uniform error
    /// display and the registry still reflects the last confirmed state.
    pub async fn dispatch(&self, node: &str) -> Result<Option<ControlAction>, DispatchError> {
        if self.dispatcher.plan(node).is_none() {
            return Ok(None);
        }
        self.surface.lock().unwrap().set_busy(true);
        let result = self.dispatcher.dispatch(node).await;
        {
            let mut surface = self.surface.lock().unwrap();
            surface.set_busy(false);
            if let Err(err) = &result {
                surface.show_error(&err.to_string());
            }
        }
        result
    }

    /// Whether the listener task is still attached.
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Stop the listener task gracefully, draining nothing further.
    pub async fn stop_listener(&mut self) {
        if let Some(state) = self.listener.take() {
            Self::stop(state).await;
        }
    }
}

impl std::fmt::Debug for WorkflowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowSession")
            .field("workflow", &self.workflow.name)
            .field("listening", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for WorkflowSession {
    fn drop(&mut self) {
        if let Some(state) = self.listener.take() {
            let _ = state.shutdown_tx.send(());
            state.handle.abort();
        }
    }
}
