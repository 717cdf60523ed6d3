//! Shared helpers for pipeline integration tests.
#![allow(dead_code)]

use manifold_pipelines::providers::bedrock::streaming::encode_chunk;
use manifold_pipelines::pipeline::PipeRequest;
use serde_json::Value;

/// Load a JSON-lines fixture: one vendor stream event per line.
pub fn load_jsonl_fixture(path: &str) -> Vec<Value> {
    let raw = std::fs::read_to_string(path).expect("read fixture");
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_str(l).expect("fixture line is JSON"))
        .collect()
}

/// Frame vendor events as a Bedrock `invoke-with-response-stream` body.
pub fn event_stream_body(events: &[Value]) -> Vec<u8> {
    let mut body = Vec::new();
    for event in events {
        body.extend_from_slice(&encode_chunk(event));
    }
    body
}

/// Host request with the given model, messages and extra body fields.
pub fn pipe_request(model: &str, messages: Value, extra: Value) -> PipeRequest {
    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "user": {"id": "u-1", "email": "someone@example.com"},
        "chat_id": "chat-1",
        "title": "A chat",
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    PipeRequest::from_body(body).expect("valid request")
}

/// Whether the JSON body carries none of the host bookkeeping fields.
pub fn has_no_bookkeeping(body: &Value) -> bool {
    ["user", "chat_id", "title"]
        .iter()
        .all(|k| body.get(*k).is_none())
}
