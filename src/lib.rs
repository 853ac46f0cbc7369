//! # Loomview: Live Workflow-Graph View Client
//!
//! Loomview keeps a rendered view of a directed workflow graph synchronized
//! with a remote execution engine. One snapshot fetch populates the canonical
//! node registry, a continuously drained event channel reconciles status and
//! stat updates into it, and a command dispatcher turns a node interaction
//! into exactly one outbound start/stop request.
//!
//! ## Core Concepts
//!
//! - **Node Registry**: the single source of truth for per-node runtime state;
//!   the render surface is a pure projection of it
//! - **Reconciliation**: events are applied strictly in arrival order, and
//!   referential misses (unknown node, out-of-range stat slot) are benign
//!   races, not errors
//! - **Command dispatch**: no optimistic updates; local state changes only
//!   when the engine's confirming event arrives
//!
//! ## Quick Start
//!
//! The reconciliation core works without any transport attached:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use loomview::events::{Reconciler, WorkflowEvent};
//! use loomview::registry::NodeRegistry;
//! use loomview::render::{shared_surface, MemorySurface};
//! use loomview::workflow::Workflow;
//! use serde_json::json;
//!
//! // Snapshot body as the engine sends it.
//! let mut workflow: Workflow = serde_json::from_value(json!({
//!     "nodes": [{"name": "demuxer", "label": "Demuxer", "status": "stopped",
//!                "stats": [{"label": "fps", "unit": "f/s"}]}],
//!     "edges": [],
//! }))
//! .unwrap();
//! workflow.name = "encode-job".to_string();
//!
//! let registry = Arc::new(Mutex::new(NodeRegistry::new()));
//! registry.lock().unwrap().populate(&workflow).unwrap();
//!
//! let memory = MemorySurface::new();
//! let reconciler = Reconciler::new(Arc::clone(&registry), shared_surface(memory.clone()));
//!
//! let event = WorkflowEvent::decode(&json!({
//!     "event": "stats",
//!     "payload": {"name": "demuxer", "stats": [{"value": 42.5}]},
//! }))
//! .unwrap()
//! .unwrap();
//! reconciler.apply(&event);
//!
//! assert_eq!(
//!     registry.lock().unwrap().get("demuxer").unwrap().stat_value(0),
//!     Some(42.5)
//! );
//! ```
//!
//! For a full session (snapshot fetch over HTTP, listener task, command
//! dispatch) see [`session::WorkflowSession::connect`] and the `live_view`
//! demo.
//!
//! ## Module Guide
//!
//! - [`workflow`] - Workflow aggregate and snapshot wire types
//! - [`registry`] - Canonical per-node runtime state
//! - [`events`] - Event decoding and reconciliation
//! - [`render`] - Render-surface boundary and state projection
//! - [`snapshot`] - One-shot snapshot loading
//! - [`dispatch`] - User intent → control requests
//! - [`transport`] - HTTP boundary to the engine
//! - [`session`] - Session lifecycle wiring it all together
//! - [`config`] - Connection settings

pub mod config;
pub mod dispatch;
pub mod events;
pub mod registry;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod transport;
pub mod workflow;
