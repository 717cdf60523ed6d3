//! Bedrock runtime client.
//!
//! Thin reqwest wrapper over `InvokeModel` and
//! `InvokeModelWithResponseStream`. Model ids are URL-encoded into the path.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;

use super::config::BedrockConfig;
use super::errors::classify_bedrock_http_error;
use super::streaming::chunk_stream;
use crate::defaults;
use crate::error::LlmError;
use crate::streaming::ChunkStream;
use crate::utils::url::join_url;

/// A fully built Bedrock client. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct BedrockRuntime {
    http_client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl BedrockRuntime {
    pub fn new(config: &BedrockConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(defaults::http::CONNECT_TIMEOUT)
            .user_agent(defaults::http::USER_AGENT)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: config.base_url(),
            headers: build_headers(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_url(&self, model_id: &str, action: &str) -> String {
        let model = urlencoding::encode(model_id);
        join_url(&self.base_url, &format!("/model/{model}/{action}"))
    }

    async fn post(
        &self,
        model_id: &str,
        action: &str,
        accept: &'static str,
        body: &Value,
    ) -> Result<reqwest::Response, LlmError> {
        let url = self.model_url(model_id, action);
        tracing::debug!(target: "manifold_pipelines::bedrock", %url, payload = %body, "invoking model");

        let resp = self
            .http_client
            .post(url)
            .headers(self.headers.clone())
            .header(ACCEPT, accept)
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_bedrock_http_error(status, &text));
        }
        Ok(resp)
    }

    /// `POST /model/{id}/invoke`, returning the decoded JSON body.
    pub async fn invoke_model(&self, model_id: &str, body: &Value) -> Result<Value, LlmError> {
        let resp = self.post(model_id, "invoke", "application/json", body).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| LlmError::malformed_response("bedrock", format!("invalid JSON: {e}")))
    }

    /// `POST /model/{id}/invoke-with-response-stream`, returning the decoded
    /// chunk payloads in arrival order.
    pub async fn invoke_model_with_response_stream(
        &self,
        model_id: &str,
        body: &Value,
    ) -> Result<ChunkStream, LlmError> {
        let resp = self
            .post(
                model_id,
                "invoke-with-response-stream",
                defaults::bedrock::EVENT_STREAM_CONTENT_TYPE,
                body,
            )
            .await?;
        Ok(chunk_stream(resp.bytes_stream()))
    }
}

fn build_headers(config: &BedrockConfig) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(api_key) = config
        .api_key
        .as_ref()
        .map(|k| k.expose_secret())
        .filter(|k| !k.trim().is_empty())
    {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                LlmError::ConfigurationError(format!("Invalid Bedrock bearer token: {e}"))
            })?,
        );
    }

    for (name, value) in &config.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LlmError::ConfigurationError(format!("invalid header `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| LlmError::ConfigurationError(format!("invalid header value: {e}")))?;
        headers.insert(name, value);
    }

    Ok(headers)
}
