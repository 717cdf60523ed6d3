//! Per-call requests handed to the transformers.

use crate::registry::ResolvedModel;
use crate::types::{ChatMessage, GenerationOptions};

/// A chat call after model resolution and options projection.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub options: GenerationOptions,
    pub model: ResolvedModel,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, options: GenerationOptions, model: ResolvedModel) -> Self {
        Self {
            messages,
            options,
            model,
        }
    }
}

/// Image generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
    pub count: u32,
}
