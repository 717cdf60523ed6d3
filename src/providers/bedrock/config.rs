//! Bedrock runtime configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::defaults;
use crate::error::LlmError;
use crate::observability::mask_secret;

pub const ENV_API_KEY: &str = "AWS_BEARER_TOKEN_BEDROCK";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT: &str = "BEDROCK_RUNTIME_ENDPOINT";

/// Connection settings for the Bedrock runtime API.
///
/// Requests carry a bearer API key when one is set. Callers that sign with
/// SigV4 elsewhere pass the signed headers through `extra_headers`.
#[derive(Clone)]
pub struct BedrockConfig {
    pub region: String,
    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com`.
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
    pub extra_headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            endpoint: None,
            api_key: None,
            extra_headers: BTreeMap::new(),
            timeout: defaults::http::REQUEST_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|k| mask_secret(k.expose_secret())),
            )
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BedrockConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    /// Read `AWS_BEARER_TOKEN_BEDROCK`, `AWS_REGION` and
    /// `BEDROCK_RUNTIME_ENDPOINT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(region) = std::env::var(ENV_REGION) {
            config.region = region;
        }
        config.endpoint = std::env::var(ENV_ENDPOINT).ok().filter(|v| !v.is_empty());
        config.api_key = std::env::var(ENV_API_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        config
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.{}.amazonaws.com",
                defaults::bedrock::SERVICE,
                self.region
            ),
        }
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.endpoint.is_none() && self.region.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "Bedrock needs a region or an explicit endpoint".into(),
            ));
        }
        url::Url::parse(&self.base_url()).map_err(|e| {
            LlmError::ConfigurationError(format!("invalid Bedrock endpoint: {e}"))
        })?;
        if self.timeout.is_zero() {
            return Err(LlmError::ConfigurationError(
                "timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
