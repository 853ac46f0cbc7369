#![allow(dead_code)]

use serde_json::{json, Value};

use loomview::workflow::Workflow;

/// Snapshot body as the engine sends it: three nodes in a line, with two,
/// one, and zero stat rows respectively.
pub fn sample_snapshot_body() -> Value {
    json!({
        "nodes": [
            {"name": "demuxer", "label": "Demuxer", "status": "started",
             "stats": [{"label": "fps", "unit": "f/s"}, {"label": "rate", "unit": "kb/s"}]},
            {"name": "encoder", "label": "Encoder", "status": "stopped",
             "stats": [{"label": "fps", "unit": "f/s"}]},
            {"name": "muxer", "label": "Muxer", "status": "stopped", "stats": []},
        ],
        "edges": [
            {"from": "demuxer", "to": "encoder"},
            {"from": "encoder", "to": "muxer"},
        ],
        "job": {"input": "rtmp://in/stream"},
    })
}

pub fn sample_workflow() -> Workflow {
    let mut workflow: Workflow =
        serde_json::from_value(sample_snapshot_body()).expect("sample body decodes");
    workflow.name = "encode-job".to_string();
    workflow
}

pub fn status_event(kind: &str, node: &str) -> Value {
    json!({"event": kind, "payload": node})
}

pub fn stats_event(node: &str, values: &[f64]) -> Value {
    let stats: Vec<Value> = values.iter().map(|value| json!({"value": value})).collect();
    json!({"event": "stats", "payload": {"name": node, "stats": stats}})
}
