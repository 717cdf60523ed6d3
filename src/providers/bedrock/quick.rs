//! One-shot Bedrock helper for scripts.
//!
//! Sends a single user prompt (plus optional system prompt) to a model picked
//! by short alias and returns the raw response body.

use std::str::FromStr;

use serde_json::{Value, json};

use super::client::BedrockRuntime;
use super::config::BedrockConfig;
use super::models;
use crate::defaults;
use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BedrockModelAlias {
    Llama3_8B,
    Llama3_70B,
    Llama3_405B,
    /// Cheapest per call when input outweighs output by 20x or more.
    #[default]
    Haiku,
    Sonnet,
}

impl BedrockModelAlias {
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Llama3_8B => models::LLAMA3_1_8B,
            Self::Llama3_70B => models::LLAMA3_1_70B,
            Self::Llama3_405B => models::LLAMA3_1_405B,
            Self::Haiku => models::CLAUDE_3_HAIKU,
            Self::Sonnet => models::CLAUDE_3_5_SONNET,
        }
    }

    pub fn is_llama(&self) -> bool {
        matches!(self, Self::Llama3_8B | Self::Llama3_70B | Self::Llama3_405B)
    }
}

impl FromStr for BedrockModelAlias {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llama3_8B" => Ok(Self::Llama3_8B),
            "llama3_70B" => Ok(Self::Llama3_70B),
            "llama3_405B" => Ok(Self::Llama3_405B),
            "haiku" => Ok(Self::Haiku),
            "sonnet" => Ok(Self::Sonnet),
            other => Err(LlmError::invalid_input(format!("Invalid model alias `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleMessageRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: BedrockModelAlias,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl SingleMessageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            model: BedrockModelAlias::default(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_model(mut self, model: BedrockModelAlias) -> Self {
        self.model = model;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Request body for the aliased model family.
    pub fn body(&self) -> Value {
        let system = self.system_prompt.as_deref().filter(|s| !s.is_empty());
        if self.model.is_llama() {
            let prompt = match system {
                Some(system) => format!("[INST]{system}[/INST]\n{}", self.prompt),
                None => self.prompt.clone(),
            };
            return json!({
                "max_gen_len": self.max_tokens,
                "temperature": self.temperature,
                "prompt": prompt,
            });
        }

        let mut body = json!({
            "anthropic_version": defaults::anthropic::ANTHROPIC_VERSION,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [{"type": "text", "text": self.prompt}],
            }],
        });
        if let Some(system) = system {
            body["system"] = Value::String(system.to_string());
        }
        body
    }
}

/// Invoke one model once and return its raw response body.
///
/// Sonnet is only hosted in `us-east-1`, so that alias overrides the
/// configured region unless an explicit endpoint is set.
pub async fn invoke_single_text_message(
    config: &BedrockConfig,
    request: &SingleMessageRequest,
) -> Result<Value, LlmError> {
    let config = if request.model == BedrockModelAlias::Sonnet {
        config.clone().with_region(defaults::anthropic::REGION)
    } else {
        config.clone()
    };
    let runtime = BedrockRuntime::new(&config)?;
    let model_id = request.model.model_id();
    tracing::debug!(model_id, region = %config.region, "single message invocation");

    let result = runtime.invoke_model(model_id, &request.body()).await?;
    log_usage(&result);
    Ok(result)
}

fn log_usage(result: &Value) {
    if let Some(usage) = result.get("usage") {
        let input_tokens = usage.get("input_tokens").and_then(Value::as_u64);
        let output_tokens = usage.get("output_tokens").and_then(Value::as_u64);
        let responses = result.get("content").and_then(Value::as_array).map(Vec::len);
        tracing::info!(input_tokens, output_tokens, responses, "invocation usage");
    } else if let Some(prompt_tokens) = result.get("prompt_token_count").and_then(Value::as_u64) {
        let output_tokens = result.get("generation_token_count").and_then(Value::as_u64);
        let stop_reason = result.get("stop_reason").and_then(Value::as_str);
        tracing::info!(
            input_tokens = prompt_tokens,
            output_tokens,
            stop_reason,
            "invocation usage"
        );
    }
}
