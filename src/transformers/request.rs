//! Request transformation traits
//!
//! Converts a resolved [`ChatRequest`] into the vendor-specific JSON body.
//! Implementations are pure: no I/O, no clock, no randomness.

use crate::error::LlmError;
use crate::types::{ChatRequest, ImageGenerationRequest};

/// Transform a gateway chat request into a provider-specific payload
pub trait RequestTransformer: Send + Sync {
    /// Provider identifier (e.g., "bedrock-anthropic", "perplexity")
    fn provider_id(&self) -> &str;

    /// Build the vendor JSON body for a chat call.
    fn transform_chat(&self, req: &ChatRequest) -> Result<serde_json::Value, LlmError>;

    /// Build the vendor JSON body for an image generation call.
    fn transform_image(&self, _req: &ImageGenerationRequest) -> Result<serde_json::Value, LlmError> {
        Err(LlmError::InvalidInput(format!(
            "{} does not implement image generation",
            self.provider_id()
        )))
    }
}

/// Fail fast on an empty conversation.
pub fn ensure_messages(req: &ChatRequest) -> Result<(), LlmError> {
    if req.messages.is_empty() {
        return Err(LlmError::invalid_input("messages must not be empty"));
    }
    Ok(())
}
