//! Bedrock response-stream decoding.
//!
//! `InvokeModelWithResponseStream` answers with AWS event-stream frames. Each
//! `chunk` event carries `{"bytes": "<base64 JSON>"}`; the decoded JSON is the
//! vendor's own stream event and is handed to a
//! [`StreamChunkTransformer`](crate::transformers::stream::StreamChunkTransformer).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::streaming::ChunkStream;
use crate::streaming::aws_event_stream::{EventStreamDecoder, Message, encode_message};

#[derive(Deserialize)]
struct ChunkPayload {
    bytes: String,
}

/// Decode one event-stream message into the vendor event it wraps.
///
/// Returns `Ok(None)` for event types other than `chunk`.
pub fn decode_message(message: &Message) -> Result<Option<Value>, LlmError> {
    match message.message_type() {
        Some("exception") | Some("error") => {
            let kind = message.exception_type().unwrap_or("UnknownException");
            let detail = serde_json::from_slice::<Value>(&message.payload)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .or_else(|| v.get("Message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .or_else(|| message.header_str(":error-message").map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&message.payload).into_owned());
            return Err(LlmError::StreamError(format!("{kind}: {detail}")));
        }
        _ => {}
    }

    if message.event_type() != Some("chunk") {
        tracing::debug!(event_type = ?message.event_type(), "skipping non-chunk event");
        return Ok(None);
    }

    let wrapper: ChunkPayload = serde_json::from_slice(&message.payload)
        .map_err(|e| LlmError::malformed_response("bedrock", format!("chunk payload: {e}")))?;
    let raw = STANDARD
        .decode(wrapper.bytes.as_bytes())
        .map_err(|e| LlmError::malformed_response("bedrock", format!("chunk bytes: {e}")))?;
    let event = serde_json::from_slice(&raw)
        .map_err(|e| LlmError::malformed_response("bedrock", format!("chunk JSON: {e}")))?;
    Ok(Some(event))
}

/// Turn the raw response body into decoded chunk events.
///
/// Pull-driven: one transport read at a time, no read-ahead. The first error
/// ends the stream.
pub fn chunk_stream<S, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = Box::pin(body);
        let mut decoder = EventStreamDecoder::new();

        while let Some(read) = body.next().await {
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };
            decoder.push(&bytes);

            loop {
                let message = match decoder.next_message() {
                    Ok(Some(message)) => message,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                match decode_message(&message) {
                    Ok(Some(event)) => {
                        yield Ok(event);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if decoder.buffered() > 0 {
            tracing::warn!(bytes = decoder.buffered(), "event stream closed mid-frame");
        }
    })
}

/// Frame a vendor event the way Bedrock does, for relays and fixtures.
pub fn encode_chunk(event: &Value) -> Bytes {
    let payload = serde_json::json!({ "bytes": STANDARD.encode(event.to_string()) });
    encode_message(
        &[
            (":event-type", "chunk"),
            (":content-type", "application/json"),
            (":message-type", "event"),
        ],
        payload.to_string().as_bytes(),
    )
}
