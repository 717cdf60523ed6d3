//! Response transformation traits
//!
//! Pulls the generated text out of a vendor envelope. A missing field path is
//! a contract break with the vendor and is reported as
//! [`LlmError::ParseError`].

use crate::error::LlmError;

/// Transform provider-specific responses into plain text
pub trait ResponseTransformer: Send + Sync {
    /// Provider identifier
    fn provider_id(&self) -> &str;

    /// First generated text of a non-streaming response.
    fn extract_text(&self, raw: &serde_json::Value) -> Result<String, LlmError>;
}

/// Follow a JSON pointer to a string, or report the missing path.
pub fn text_at(
    provider_id: &str,
    raw: &serde_json::Value,
    pointer: &str,
) -> Result<String, LlmError> {
    raw.pointer(pointer)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| LlmError::malformed_response(provider_id, format!("missing `{pointer}`")))
}
