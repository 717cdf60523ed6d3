//! Model descriptors.

use serde::{Deserialize, Serialize};

/// Vendor family a model belongs to. Resolved once when a registry is built
/// so per-call dispatch never inspects id substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Anthropic models on Bedrock; chat-native.
    BedrockAnthropic,
    /// Meta Llama models on Bedrock; continuation-style.
    BedrockMeta,
    /// OpenAI image generation.
    OpenAiImages,
    /// Perplexity chat completions.
    Perplexity,
}

impl Vendor {
    pub fn provider_id(&self) -> &'static str {
        match self {
            Self::BedrockAnthropic => "bedrock-anthropic",
            Self::BedrockMeta => "bedrock-meta",
            Self::OpenAiImages => "openai-images",
            Self::Perplexity => "perplexity",
        }
    }
}

/// A selectable model. Ids may carry a `__<variant>` suffix that selects a
/// different fixed system prompt for the same upstream model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}
