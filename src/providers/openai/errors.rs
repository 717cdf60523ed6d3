//! Error classification for OpenAI-style JSON APIs.
//!
//! Bodies look like `{"error": {"message": "...", "type": "...", "code": ...}}`.

use crate::error::LlmError;

fn extract_message(json: &serde_json::Value) -> Option<String> {
    json.pointer("/error/message")
        .or_else(|| json.get("message"))
        .or_else(|| json.get("detail"))
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Map a failed response of an OpenAI-compatible endpoint to an error variant.
pub fn classify_openai_http_error(provider_id: &str, status: u16, body_text: &str) -> LlmError {
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

    match status {
        401 | 403 => LlmError::AuthenticationError(format!("{provider_id}: {message}")),
        404 => LlmError::NotFound(format!("{provider_id}: {message}")),
        429 => LlmError::RateLimitError(format!("{provider_id}: {message}")),
        _ => LlmError::ApiError {
            code: status,
            message: format!("{provider_id} API error: {message}"),
            details: json,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message_is_used() {
        let err = classify_openai_http_error(
            "openai-images",
            400,
            r#"{"error":{"message":"Your request was rejected","type":"invalid_request_error"}}"#,
        );
        assert!(matches!(
            err,
            LlmError::ApiError { code: 400, ref message, .. } if message == "openai-images API error: Your request was rejected"
        ));
    }

    #[test]
    fn status_classes() {
        assert!(matches!(
            classify_openai_http_error("perplexity", 401, "{}"),
            LlmError::AuthenticationError(_)
        ));
        assert!(matches!(
            classify_openai_http_error("perplexity", 429, "slow down"),
            LlmError::RateLimitError(ref m) if m == "perplexity: slow down"
        ));
    }
}
