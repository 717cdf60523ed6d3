//! Core error types.

use thiserror::Error;

/// Coarse classification used for logging and for deciding how a pipeline
/// surfaces a failure to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input or a policy limit; the call was never issued.
    Validation,
    /// The vendor could not be reached or rejected the call.
    Transport,
    /// The vendor answered with a body that breaks its documented contract.
    Contract,
    /// Local configuration or filesystem problems.
    Local,
}

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Empty message list, unsupported role, missing prompt, ...
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Image count or size policy violated.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Vendor stream reported an exception frame.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Vendor envelope is missing the expected fields.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl LlmError {
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn malformed_response(provider: &str, message: impl std::fmt::Display) -> Self {
        Self::ParseError(format!("{provider} response: {message}"))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) | Self::LimitExceeded(_) => ErrorCategory::Validation,
            Self::HttpError(_)
            | Self::ConnectionError(_)
            | Self::TimeoutError(_)
            | Self::AuthenticationError(_)
            | Self::RateLimitError(_)
            | Self::NotFound(_)
            | Self::ApiError { .. }
            | Self::StreamError(_) => ErrorCategory::Transport,
            Self::ParseError(_) | Self::JsonError(_) => ErrorCategory::Contract,
            Self::ConfigurationError(_) | Self::IoError(_) => ErrorCategory::Local,
        }
    }

    /// Transport failures are returned to the host as a displayable error
    /// string instead of a fault.
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }
}
