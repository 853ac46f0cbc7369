mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{sample_snapshot_body, stats_event, status_event};
use httpmock::prelude::*;
use loomview::config::ClientConfig;
use loomview::dispatch::ControlAction;
use loomview::render::{shared_surface, MemorySurface, SurfaceCall};
use loomview::session::{SessionError, WorkflowSession};
use loomview::transport::{EngineTransport, HttpEngineTransport};
use loomview::workflow::NodeStatus;
use serde_json::json;
use tokio::time::sleep;

fn transport_for(server: &MockServer) -> Arc<dyn EngineTransport> {
    Arc::new(HttpEngineTransport::new(server.base_url()))
}

/// Poll until `predicate` holds or the deadline passes; the listener applies
/// events asynchronously.
async fn wait_for(mut predicate: impl FnMut() -> bool) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn connect_draws_the_initial_projection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/encode-job");
            then.status(200).json_body(sample_snapshot_body());
        })
        .await;

    let (_, events_rx) = flume::unbounded();
    let memory = MemorySurface::new();
    let config = ClientConfig::new(server.base_url(), "encode-job");

    let session = WorkflowSession::connect(
        &config,
        transport_for(&server),
        shared_surface(memory.clone()),
        events_rx,
    )
    .await
    .unwrap();

    assert_eq!(session.workflow().name, "encode-job");
    assert_eq!(session.status_of("demuxer"), Some(NodeStatus::Started));
    assert!(session.is_listening());

    let calls = memory.snapshot();
    assert_eq!(calls.first(), Some(&SurfaceCall::Busy(true)));
    assert_eq!(calls.last(), Some(&SurfaceCall::Busy(false)));
    assert!(calls.iter().any(|call| matches!(call, SurfaceCall::Draw(desc) if desc.nodes.len() == 3)));
    assert!(calls
        .iter()
        .any(|call| matches!(call, SurfaceCall::Job(job) if job["input"] == "rtmp://in/stream")));

    let mermaid = session.project().to_mermaid();
    assert!(mermaid.starts_with("graph TB\n"));
    assert!(mermaid.contains("demuxer-->encoder"));
    assert!(mermaid.contains("class demuxer started;"));
}

// End-to-end round trip: a stats event becomes "42.50" on the surface, then
// a click on the stopped node sends exactly one /start command.
#[tokio::test]
async fn stats_then_click_round_trip() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/w");
            then.status(200).json_body(json!({
                "nodes": [{"name": "A", "label": "A", "status": "stopped",
                           "stats": [{"label": "cpu", "unit": "%"}]}],
                "edges": [],
            }));
        })
        .await;
    let start = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/w/nodes/A/start");
            then.status(200);
        })
        .await;

    let (events_tx, events_rx) = flume::unbounded();
    let memory = MemorySurface::new();
    let config = ClientConfig::new(server.base_url(), "w");

    let session = WorkflowSession::connect(
        &config,
        transport_for(&server),
        shared_surface(memory.clone()),
        events_rx,
    )
    .await
    .unwrap();

    events_tx.send(stats_event("A", &[42.5])).unwrap();
    let probe = memory.clone();
    wait_for(move || {
        probe.snapshot().iter().any(|call| {
            matches!(call, SurfaceCall::StatText { node, index: 0, text }
                if node == "A" && text == "42.50")
        })
    })
    .await;

    let action = session.dispatch("A").await.unwrap();
    assert_eq!(action, Some(ControlAction::Start));
    start.assert_async().await;

    // Still stopped: no optimistic update, no confirming event was sent.
    assert_eq!(session.status_of("A"), Some(NodeStatus::Stopped));
}

#[tokio::test]
async fn confirming_event_closes_the_command_loop() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/encode-job");
            then.status(200).json_body(sample_snapshot_body());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/workflows/encode-job/nodes/encoder/start");
            then.status(200);
        })
        .await;

    let (events_tx, events_rx) = flume::unbounded();
    let memory = MemorySurface::new();
    let config = ClientConfig::new(server.base_url(), "encode-job");

    let session = WorkflowSession::connect(
        &config,
        transport_for(&server),
        shared_surface(memory.clone()),
        events_rx,
    )
    .await
    .unwrap();

    // Dispatch through an injected handle, the way a click surface holds one.
    let dispatcher = session.dispatcher();
    dispatcher.dispatch("encoder").await.unwrap();
    assert_eq!(session.status_of("encoder"), Some(NodeStatus::Stopped));

    events_tx
        .send(status_event("node.started", "encoder"))
        .unwrap();
    let probe = session.registry();
    wait_for(move || {
        probe.lock().unwrap().get("encoder").map(|entry| entry.status)
            == Some(NodeStatus::Started)
    })
    .await;
}

#[tokio::test]
async fn events_racing_ahead_of_the_snapshot_are_dropped() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/encode-job");
            then.status(200).json_body(sample_snapshot_body());
        })
        .await;

    let (events_tx, events_rx) = flume::unbounded();
    // Queued before connect: the listener may see these against an empty
    // registry, and "ghost" is never declared either way.
    events_tx
        .send(status_event("node.started", "ghost"))
        .unwrap();
    events_tx.send(stats_event("ghost", &[1.0])).unwrap();
    events_tx
        .send(json!({"event": "workflow.archived", "payload": {}}))
        .unwrap();

    let memory = MemorySurface::new();
    let config = ClientConfig::new(server.base_url(), "encode-job");
    let session = WorkflowSession::connect(
        &config,
        transport_for(&server),
        shared_surface(memory.clone()),
        events_rx,
    )
    .await
    .unwrap();

    // A later event for a known node still applies.
    events_tx
        .send(status_event("node.stopped", "demuxer"))
        .unwrap();
    let probe = session.registry();
    wait_for(move || {
        probe.lock().unwrap().get("demuxer").map(|entry| entry.status)
            == Some(NodeStatus::Stopped)
    })
    .await;

    assert_eq!(session.status_of("ghost"), None);
    assert!(!memory
        .snapshot()
        .iter()
        .any(|call| matches!(call, SurfaceCall::Status { node, .. } if node == "ghost")));
}

#[tokio::test]
async fn load_failure_surfaces_one_error_and_no_session() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/encode-job");
            then.status(500);
        })
        .await;

    let (_, events_rx) = flume::unbounded();
    let memory = MemorySurface::new();
    let config = ClientConfig::new(server.base_url(), "encode-job");

    let err = WorkflowSession::connect(
        &config,
        transport_for(&server),
        shared_surface(memory.clone()),
        events_rx,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SessionError::SnapshotLoad(_)));

    let calls = memory.snapshot();
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, SurfaceCall::Error(_)))
            .count(),
        1
    );
    assert!(!calls.iter().any(|call| matches!(call, SurfaceCall::Draw(_))));
    assert_eq!(calls.last(), Some(&SurfaceCall::Busy(false)));
}

#[tokio::test]
async fn stopped_listener_ignores_further_events() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/encode-job");
            then.status(200).json_body(sample_snapshot_body());
        })
        .await;

    let (events_tx, events_rx) = flume::unbounded();
    let memory = MemorySurface::new();
    let config = ClientConfig::new(server.base_url(), "encode-job");

    let mut session = WorkflowSession::connect(
        &config,
        transport_for(&server),
        shared_surface(memory.clone()),
        events_rx,
    )
    .await
    .unwrap();

    session.stop_listener().await;
    assert!(!session.is_listening());

    // The receiver side is gone with the listener; the send may fail, and
    // either way nothing reconciles anymore.
    let _ = events_tx.send(status_event("node.stopped", "demuxer"));
    sleep(Duration::from_millis(50)).await;
    assert_eq!(session.status_of("demuxer"), Some(NodeStatus::Started));
}
