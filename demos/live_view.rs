//! Live view demo against an embedded fake engine.
//!
//! Spins up a small axum server standing in for the execution engine (one
//! snapshot route, control routes that answer with confirming events, a stats
//! ticker), then connects a [`WorkflowSession`] to it and toggles a node.
//!
//! Run with:
//!   cargo run --example live_view

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, time::sleep};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use loomview::{
    config::ClientConfig,
    render::{shared_surface, LogSurface},
    session::WorkflowSession,
    transport::{EngineTransport, HttpEngineTransport},
};

#[derive(Clone)]
struct Engine {
    events_tx: flume::Sender<Value>,
}

async fn snapshot(Path(name): Path<String>) -> Json<Value> {
    tracing::info!(workflow = %name, "serving snapshot");
    Json(json!({
        "nodes": [
            {"name": "demuxer", "label": "Demuxer", "status": "started",
             "stats": [{"label": "fps", "unit": "f/s"}]},
            {"name": "encoder", "label": "Encoder", "status": "stopped",
             "stats": [{"label": "fps", "unit": "f/s"}, {"label": "q", "unit": ""}]},
            {"name": "muxer", "label": "Muxer", "status": "stopped", "stats": []},
        ],
        "edges": [
            {"from": "demuxer", "to": "encoder"},
            {"from": "encoder", "to": "muxer"},
        ],
        "job": {"input": "rtmp://in/stream", "output": "out.mp4"},
    }))
}

async fn control(
    State(engine): State<Engine>,
    Path((workflow, node, action)): Path<(String, String, String)>,
) -> Json<Value> {
    tracing::info!(%workflow, %node, %action, "control command received");
    let event = if action == "start" {
        "node.started"
    } else {
        "node.stopped"
    };
    // Confirm the command the way the real engine does: over the event feed.
    let _ = engine.events_tx.send(json!({"event": event, "payload": node}));
    Json(json!({"ok": true}))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let (events_tx, events_rx) = flume::unbounded();
    let engine = Engine {
        events_tx: events_tx.clone(),
    };

    let router = Router::new()
        .route("/api/workflows/{name}", get(snapshot))
        .route("/api/workflows/{workflow}/nodes/{node}/{action}", get(control))
        .with_state(engine);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router.into_make_service()).await {
            tracing::error!("fake engine error: {err:?}");
        }
    });

    // Stats ticker: the demuxer reports a drifting frame rate.
    tokio::spawn(async move {
        for tick in 0..5u32 {
            sleep(Duration::from_millis(400)).await;
            let fps = 25.0 + f64::from(tick) * 0.1;
            let _ = events_tx.send(json!({
                "event": "stats",
                "payload": {"name": "demuxer", "stats": [{"value": fps}]},
            }));
        }
    });

    let config = ClientConfig::new(format!("http://{addr}"), "encode-job");
    let transport: Arc<dyn EngineTransport> =
        Arc::new(HttpEngineTransport::new(config.base_url.clone()));
    let surface = shared_surface(LogSurface);

    let mut session = WorkflowSession::connect(&config, transport, surface, events_rx).await?;
    println!("{}", session.project().to_mermaid());

    // Toggle the encoder: stopped -> start command -> confirming event.
    session.dispatch("encoder").await?;
    sleep(Duration::from_millis(200)).await;
    tracing::info!(status = ?session.status_of("encoder"), "encoder after start");

    // And back again.
    session.dispatch("encoder").await?;
    sleep(Duration::from_millis(200)).await;
    tracing::info!(status = ?session.status_of("encoder"), "encoder after stop");

    // Let the stats ticker finish, then show the final projection.
    sleep(Duration::from_secs(2)).await;
    println!("{}", session.project().to_mermaid());

    session.stop_listener().await;
    Ok(())
}
