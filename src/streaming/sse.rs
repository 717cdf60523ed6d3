//! SSE JSON streaming helpers
//!
//! For vendors that emit one JSON object per SSE `data:` payload.

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::Stream;
use futures_util::StreamExt;
use serde_json::Value;

use super::ChunkStream;
use crate::error::LlmError;

/// End-of-stream payload of OpenAI-compatible APIs.
pub const DONE_MARKER: &str = "[DONE]";

/// Parse SSE `data:` payloads as JSON.
///
/// Empty payloads are skipped. The done marker is passed through as
/// `Value::String("[DONE]")` so decoders can record a clean finish, and ends
/// the stream.
pub fn sse_json_stream<S, E>(label: &str, byte_stream: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    let label = label.to_string();
    let byte_stream = byte_stream.map(|chunk| chunk.map_err(Into::<LlmError>::into));

    Box::pin(async_stream::stream! {
        let mut events = Box::pin(byte_stream.eventsource());

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    yield Err(LlmError::StreamError(format!("SSE stream error ({label}): {e}")));
                    return;
                }
            };

            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == DONE_MARKER {
                yield Ok(Value::String(DONE_MARKER.to_string()));
                return;
            }

            match serde_json::from_str::<Value>(data) {
                Ok(payload) => {
                    yield Ok(payload);
                }
                Err(e) => {
                    yield Err(LlmError::ParseError(format!(
                        "Failed to parse SSE JSON ({label}): {e}"
                    )));
                    return;
                }
            }
        }
    })
}
