//! Anthropic models on Bedrock.
//!
//! Chat-native: turns are sent as structured messages with typed content
//! blocks and the system prompt travels in its own field.

use serde_json::{Value, json};

use crate::defaults::anthropic as defaults;
use crate::error::LlmError;
use crate::transformers::request::{RequestTransformer, ensure_messages};
use crate::transformers::response::{ResponseTransformer, text_at};
use crate::transformers::stream::{StreamChunkTransformer, StreamDelta};
use crate::types::{ChatRequest, MessageRole, pop_system_message};
use crate::utils::multimodal::ContentNormalizer;

const PROVIDER_ID: &str = "bedrock-anthropic";

#[derive(Debug, Clone, Default)]
pub struct AnthropicRequestTransformer;

impl RequestTransformer for AnthropicRequestTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn transform_chat(&self, req: &ChatRequest) -> Result<Value, LlmError> {
        ensure_messages(req)?;

        let (system_message, turns) = pop_system_message(&req.messages);
        if turns.iter().any(|m| m.role == MessageRole::System) {
            return Err(LlmError::invalid_input(
                "only one system message is supported",
            ));
        }
        if turns.is_empty() {
            return Err(LlmError::invalid_input(
                "at least one user or assistant message is required",
            ));
        }

        let mut normalizer = ContentNormalizer::new();
        let mut messages = Vec::with_capacity(turns.len());
        for turn in &turns {
            let blocks = normalizer.normalize(&turn.content)?;
            messages.push(json!({
                "role": turn.role.as_str(),
                "content": blocks,
            }));
        }
        let budget = normalizer.budget();
        if budget.count > 0 {
            tracing::debug!(
                images = budget.count,
                estimated_bytes = budget.total_bytes,
                "attaching images"
            );
        }

        let options = &req.options;
        let mut body = json!({
            "anthropic_version": defaults::ANTHROPIC_VERSION,
            "max_tokens": options.max_tokens.unwrap_or(defaults::MAX_TOKENS),
            "temperature": options.temperature.unwrap_or(defaults::TEMPERATURE),
            "top_k": options.top_k.unwrap_or(defaults::TOP_K),
            "top_p": options.top_p.unwrap_or(defaults::TOP_P),
            "stop_sequences": options.stop.clone().unwrap_or_default(),
            "messages": messages,
        });

        let system = req
            .model
            .system_prompt()
            .map(str::to_string)
            .or(system_message)
            .filter(|s| !s.is_empty());
        if let Some(system) = system {
            body["system"] = Value::String(system);
        }

        Ok(body)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnthropicResponseTransformer;

impl ResponseTransformer for AnthropicResponseTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn extract_text(&self, raw: &Value) -> Result<String, LlmError> {
        text_at(PROVIDER_ID, raw, "/content/0/text")
    }
}

/// Maps Anthropic stream events to text.
///
/// `content_block_start` carries the initial text of a block and
/// `content_block_delta` the increments. `message_delta` reports the stop
/// reason and `message_stop` ends the message.
#[derive(Debug, Clone, Default)]
pub struct AnthropicChunkDecoder;

impl StreamChunkTransformer for AnthropicChunkDecoder {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn convert_chunk(&self, chunk: &Value) -> Vec<StreamDelta> {
        let text = |pointer: &str| {
            chunk
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(|t| vec![StreamDelta::Text(t.to_string())])
                .unwrap_or_default()
        };

        match chunk.get("type").and_then(Value::as_str) {
            Some("content_block_start") => text("/content_block/text"),
            Some("content_block_delta") => text("/delta/text"),
            Some("message_delta") => chunk
                .pointer("/delta/stop_reason")
                .and_then(Value::as_str)
                .map(|reason| {
                    vec![StreamDelta::Finished {
                        stop_reason: Some(reason.to_string()),
                    }]
                })
                .unwrap_or_default(),
            Some("message_stop") => {
                if let Some(metrics) = chunk.get("amazon-bedrock-invocationMetrics") {
                    tracing::debug!(%metrics, "invocation metrics");
                }
                vec![StreamDelta::Finished { stop_reason: None }]
            }
            _ => Vec::new(),
        }
    }
}
