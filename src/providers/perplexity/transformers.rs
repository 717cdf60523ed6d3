//! Perplexity request/response transformers.
//!
//! The API is OpenAI-compatible. Only the latest user message is forwarded,
//! behind a fixed system prompt; earlier turns are not sent.

use serde_json::{Map, Value, json};

use crate::defaults;
use crate::error::LlmError;
use crate::streaming::sse::DONE_MARKER;
use crate::transformers::request::{RequestTransformer, ensure_messages};
use crate::transformers::response::{ResponseTransformer, text_at};
use crate::transformers::stream::{StreamChunkTransformer, StreamDelta};
use crate::types::{ChatRequest, last_user_message};

pub(crate) const PROVIDER_ID: &str = "perplexity";

#[derive(Debug, Clone, Default)]
pub struct PerplexityRequestTransformer;

impl PerplexityRequestTransformer {
    /// Body for a single prompt.
    pub fn body_for_prompt(&self, req: &ChatRequest, prompt: &str) -> Result<Value, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::invalid_input("no user message to send"));
        }
        let mut body = Map::new();
        body.insert("model".into(), json!(req.model.target_model_id));
        body.insert(
            "messages".into(),
            json!([
                {"role": "system", "content": defaults::perplexity::SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ]),
        );
        let options = &req.options;
        if let Some(max_tokens) = options.max_tokens {
            body.insert("max_tokens".into(), json!(max_tokens));
        }
        if let Some(temperature) = options.temperature {
            body.insert("temperature".into(), json!(temperature));
        }
        if let Some(top_p) = options.top_p {
            body.insert("top_p".into(), json!(top_p));
        }
        if options.stream {
            body.insert("stream".into(), Value::Bool(true));
        }
        Ok(Value::Object(body))
    }
}

impl RequestTransformer for PerplexityRequestTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn transform_chat(&self, req: &ChatRequest) -> Result<Value, LlmError> {
        ensure_messages(req)?;
        let prompt = last_user_message(&req.messages).unwrap_or_default();
        self.body_for_prompt(req, &prompt)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PerplexityResponseTransformer;

impl ResponseTransformer for PerplexityResponseTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn extract_text(&self, raw: &Value) -> Result<String, LlmError> {
        text_at(PROVIDER_ID, raw, "/choices/0/message/content")
    }
}

/// Maps `chat.completion.chunk` payloads to text.
#[derive(Debug, Clone, Default)]
pub struct PerplexityChunkDecoder;

impl StreamChunkTransformer for PerplexityChunkDecoder {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn convert_chunk(&self, chunk: &Value) -> Vec<StreamDelta> {
        if chunk.as_str() == Some(DONE_MARKER) {
            return vec![StreamDelta::Finished { stop_reason: None }];
        }
        let mut out = Vec::new();
        if let Some(text) = chunk.pointer("/choices/0/delta/content").and_then(Value::as_str) {
            out.push(StreamDelta::Text(text.to_string()));
        }
        if let Some(reason) = chunk.pointer("/choices/0/finish_reason").and_then(Value::as_str) {
            out.push(StreamDelta::Finished {
                stop_reason: Some(reason.to_string()),
            });
        }
        out
    }
}
