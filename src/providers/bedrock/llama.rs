//! Meta Llama models on Bedrock.
//!
//! Continuation-style: the whole conversation is templated into one prompt
//! string using Llama 3 turn markers.

use serde_json::{Value, json};

use crate::defaults::llama as defaults;
use crate::error::LlmError;
use crate::transformers::request::{RequestTransformer, ensure_messages};
use crate::transformers::response::{ResponseTransformer, text_at};
use crate::transformers::stream::{StreamChunkTransformer, StreamDelta};
use crate::types::{ChatMessage, ChatRequest};

const PROVIDER_ID: &str = "bedrock-meta";

/// Render the conversation as a Llama 3 prompt.
///
/// A synthetic preamble explains the role convention, then every message
/// (system turns included) becomes `<|{role}_id|>\n\n{text}\n<|eot_id|>\n`.
pub fn render_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = format!(
        " \n\n{}\n{}\n",
        defaults::ROLE_CONVENTION_PROMPT,
        defaults::END_OF_TURN
    );
    for message in messages {
        let dropped = message.content.image_count();
        if dropped > 0 {
            tracing::warn!(role = %message.role, dropped, "dropping image parts from text-only prompt");
        }
        prompt.push_str(&format!(
            "<|{}_id|>\n\n{}\n{}\n",
            message.role,
            message.content.text(),
            defaults::END_OF_TURN
        ));
    }
    prompt
}

#[derive(Debug, Clone, Default)]
pub struct LlamaRequestTransformer;

impl RequestTransformer for LlamaRequestTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn transform_chat(&self, req: &ChatRequest) -> Result<Value, LlmError> {
        ensure_messages(req)?;
        let options = &req.options;
        Ok(json!({
            "max_gen_len": options.max_tokens.unwrap_or(defaults::MAX_GEN_LEN),
            "temperature": options.temperature.unwrap_or(defaults::TEMPERATURE),
            "top_p": options.top_p.unwrap_or(defaults::TOP_P),
            "prompt": render_prompt(&req.messages),
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlamaResponseTransformer;

impl ResponseTransformer for LlamaResponseTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn extract_text(&self, raw: &Value) -> Result<String, LlmError> {
        text_at(PROVIDER_ID, raw, "/generation")
    }
}

/// Stream chunks look like `{"generation": "...", "stop_reason": null}`; the
/// last one carries a non-null `stop_reason`.
#[derive(Debug, Clone, Default)]
pub struct LlamaChunkDecoder;

impl StreamChunkTransformer for LlamaChunkDecoder {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn convert_chunk(&self, chunk: &Value) -> Vec<StreamDelta> {
        let mut out = Vec::new();
        if let Some(text) = chunk.get("generation").and_then(Value::as_str) {
            out.push(StreamDelta::Text(text.to_string()));
        }
        if let Some(reason) = chunk.get("stop_reason").and_then(Value::as_str) {
            out.push(StreamDelta::Finished {
                stop_reason: Some(reason.to_string()),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::bedrock::models::{LLAMA3_1_8B, llama_models};
    use crate::registry::ModelRegistry;
    use crate::types::{ContentPart, GenerationOptions, Vendor};
    use tracing_test::traced_test;

    fn request(messages: Vec<ChatMessage>, options: GenerationOptions) -> ChatRequest {
        let model = ModelRegistry::new(Vendor::BedrockMeta, llama_models())
            .resolve(LLAMA3_1_8B)
            .unwrap();
        ChatRequest::new(messages, options, model)
    }

    #[test]
    fn prompt_templates_every_turn() {
        let prompt = render_prompt(&[
            ChatMessage::system("sys"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ]);
        let expected = format!(
            " \n\n{}\n<|eot_id|>\n<|system_id|>\n\nsys\n<|eot_id|>\n<|user_id|>\n\nhi\n<|eot_id|>\n<|assistant_id|>\n\nhello\n<|eot_id|>\n",
            defaults::ROLE_CONVENTION_PROMPT
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn body_uses_llama_defaults() {
        let body = LlamaRequestTransformer
            .transform_chat(&request(vec![ChatMessage::user("hi")], GenerationOptions::default()))
            .unwrap();
        assert_eq!(body["max_gen_len"], 2048);
        assert_eq!(body["temperature"], 0.8);
        assert_eq!(body["top_p"], 0.9);
        assert!(body.get("top_k").is_none());
        assert!(body.get("stop_sequences").is_none());
        assert_eq!(body.as_object().unwrap().len(), 4);
    }

    #[test]
    fn max_tokens_maps_to_max_gen_len() {
        let options = GenerationOptions::default().with_max_tokens(64).with_top_k(5);
        let body = LlamaRequestTransformer
            .transform_chat(&request(vec![ChatMessage::user("hi")], options))
            .unwrap();
        assert_eq!(body["max_gen_len"], 64);
        assert!(body.get("top_k").is_none());
    }

    #[test]
    #[traced_test]
    fn images_are_dropped_from_prompt() {
        let message = ChatMessage::user_parts(vec![
            ContentPart::text("describe"),
            ContentPart::image_url("https://example.com/cat.png").unwrap(),
        ]);
        let prompt = render_prompt(&[message]);
        assert!(prompt.ends_with("<|user_id|>\n\ndescribe\n<|eot_id|>\n"));
        assert!(!prompt.contains("cat.png"));
        assert!(logs_contain("dropping image parts"));
    }

    #[test]
    fn empty_messages_are_rejected() {
        assert!(matches!(
            LlamaRequestTransformer.transform_chat(&request(vec![], GenerationOptions::default())),
            Err(LlmError::InvalidInput(_))
        ));
    }

    #[test]
    fn generation_is_extracted() {
        assert_eq!(
            LlamaResponseTransformer
                .extract_text(&json!({"generation": "ok", "stop_reason": "stop"}))
                .unwrap(),
            "ok"
        );
        assert!(LlamaResponseTransformer.extract_text(&json!({})).is_err());
    }

    #[test]
    fn final_chunk_finishes() {
        let deltas = LlamaChunkDecoder.convert_chunk(&json!({"generation": "", "stop_reason": "stop"}));
        assert_eq!(
            deltas,
            vec![
                StreamDelta::Text(String::new()),
                StreamDelta::Finished { stop_reason: Some("stop".into()) }
            ]
        );
    }
}
