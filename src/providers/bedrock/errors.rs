//! Bedrock HTTP error classification.
//!
//! Runtime endpoints return JSON error bodies shaped like
//! `{ "message": "...", "__type": "..." }`. The vendor message is kept intact;
//! the status and error type pick the [`LlmError`] variant.

use crate::error::LlmError;

fn extract_message(json: &serde_json::Value) -> Option<String> {
    json.get("message")
        .and_then(|v| v.as_str())
        .or_else(|| json.get("Message").and_then(|v| v.as_str()))
        .or_else(|| json.get("errorMessage").and_then(|v| v.as_str()))
        .or_else(|| {
            json.get("error")
                .and_then(|v| v.get("message"))
                .and_then(|v| v.as_str())
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_error_type(json: &serde_json::Value) -> Option<String> {
    json.get("__type")
        .and_then(|v| v.as_str())
        .or_else(|| json.get("code").and_then(|v| v.as_str()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Map a failed Bedrock response to an error variant.
pub fn classify_bedrock_http_error(status: u16, body_text: &str) -> LlmError {
    let json = serde_json::from_str::<serde_json::Value>(body_text).ok();
    let message = json
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| {
            let trimmed = body_text.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
    let err_type = json
        .as_ref()
        .and_then(extract_error_type)
        .unwrap_or_default()
        .to_lowercase();

    if status == 429 || err_type.contains("throttl") || message.to_lowercase().contains("throttl") {
        return LlmError::RateLimitError(message);
    }

    match status {
        401 | 403 => LlmError::AuthenticationError(message),
        404 => LlmError::NotFound(message),
        _ => LlmError::ApiError {
            code: status,
            message,
            details: json,
        },
    }
}
