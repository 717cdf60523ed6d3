//! Stream chunk transformation traits
//!
//! Converts one decoded vendor stream chunk (the JSON inside an event-stream
//! frame or an SSE `data:` line) into zero or more [`StreamDelta`]s.

/// Normalized piece of a streamed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    /// Incremental text.
    Text(String),
    /// The vendor signalled a clean end of generation.
    Finished { stop_reason: Option<String> },
}

/// Convert vendor stream chunks to text deltas. Unknown chunk kinds yield
/// nothing and are not errors.
pub trait StreamChunkTransformer: Send + Sync {
    /// Provider identifier
    fn provider_id(&self) -> &str;

    fn convert_chunk(&self, chunk: &serde_json::Value) -> Vec<StreamDelta>;
}
