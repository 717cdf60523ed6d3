//! Perplexity configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::defaults;
use crate::error::LlmError;
use crate::observability::mask_secret;

pub const ENV_BASE_URL: &str = "PERPLEXITY_API_BASE_URL";
pub const ENV_API_KEY: &str = "PERPLEXITY_API_KEY";

#[derive(Clone)]
pub struct PerplexityConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::perplexity::BASE_URL.to_string(),
            api_key: None,
            timeout: defaults::http::REQUEST_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for PerplexityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|k| mask_secret(k.expose_secret())),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PerplexityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var(ENV_BASE_URL)
            && !base_url.is_empty()
        {
            config.base_url = base_url;
        }
        config.api_key = std::env::var(ENV_API_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        url::Url::parse(&self.base_url).map_err(|e| {
            LlmError::ConfigurationError(format!("invalid Perplexity base URL: {e}"))
        })?;
        Ok(())
    }
}
