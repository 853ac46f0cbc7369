//! Inbound event channel: envelope decoding and reconciliation.
//!
//! The module is organised around the closed [`WorkflowEvent`] union decoded
//! from tagged channel messages, and the [`Reconciler`] that applies decoded
//! events to the node registry in strict arrival order.

pub mod envelope;
pub mod reconciler;

pub use envelope::{EventDecodeError, StatUpdate, WorkflowEvent};
pub use reconciler::{ReconcileOutcome, Reconciler};
