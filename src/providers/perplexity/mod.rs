//! Perplexity web-search-augmented chat.

pub mod config;
pub mod models;
pub mod transformers;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;

pub use config::PerplexityConfig;

use crate::defaults;
use crate::error::LlmError;
use crate::pipeline::{ClientSlot, InvocationResult, PipeRequest, Pipeline};
use crate::providers::openai::errors::classify_openai_http_error;
use crate::registry::ModelRegistry;
use crate::streaming::sse::sse_json_stream;
use crate::streaming::{ChunkStream, decode_text_stream};
use crate::transformers::response::ResponseTransformer;
use crate::types::{ChatRequest, ModelDescriptor, Vendor};
use crate::utils::url::join_url;
use transformers::{
    PROVIDER_ID, PerplexityChunkDecoder, PerplexityRequestTransformer,
    PerplexityResponseTransformer,
};

/// `POST {base}/chat/completions` client.
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    http_client: reqwest::Client,
    config: PerplexityConfig,
    headers: HeaderMap,
}

impl PerplexityClient {
    pub fn new(config: PerplexityConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(defaults::http::CONNECT_TIMEOUT)
            .user_agent(defaults::http::USER_AGENT)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("HTTP client: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                    .map_err(|e| LlmError::ConfigurationError(format!("Invalid API key: {e}")))?,
            );
        }

        Ok(Self {
            http_client,
            config,
            headers,
        })
    }

    pub fn config(&self) -> &PerplexityConfig {
        &self.config
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, LlmError> {
        let url = join_url(&self.config.base_url, "/chat/completions");
        tracing::debug!(%url, payload = %body, "perplexity request");
        let resp = self
            .http_client
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_openai_http_error(PROVIDER_ID, status, &text));
        }
        Ok(resp)
    }

    pub async fn chat(&self, body: &Value) -> Result<Value, LlmError> {
        let resp = self.post(body).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| LlmError::malformed_response(PROVIDER_ID, format!("invalid JSON: {e}")))
    }

    pub async fn chat_stream(&self, body: &Value) -> Result<ChunkStream, LlmError> {
        let resp = self.post(body).await?;
        Ok(sse_json_stream(PROVIDER_ID, resp.bytes_stream()))
    }
}

/// Perplexity manifold (`perplexity`).
#[derive(Debug)]
pub struct PerplexityPipeline {
    registry: ModelRegistry,
    request_transformer: PerplexityRequestTransformer,
    response_transformer: PerplexityResponseTransformer,
    stream_decoder: Arc<PerplexityChunkDecoder>,
    client: ClientSlot<PerplexityClient>,
}

impl PerplexityPipeline {
    pub fn new(config: PerplexityConfig) -> Result<Self, LlmError> {
        Ok(Self {
            registry: ModelRegistry::new(Vendor::Perplexity, models::perplexity_models()),
            request_transformer: PerplexityRequestTransformer,
            response_transformer: PerplexityResponseTransformer,
            stream_decoder: Arc::new(PerplexityChunkDecoder),
            client: ClientSlot::new(PerplexityClient::new(config)?),
        })
    }

    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(PerplexityConfig::from_env())
    }

    pub async fn config(&self) -> PerplexityConfig {
        self.client.current().await.config().clone()
    }

    pub async fn reconfigure(&self, config: PerplexityConfig) -> Result<(), LlmError> {
        let client = PerplexityClient::new(config)?;
        self.client.replace(client).await;
        Ok(())
    }
}

#[async_trait]
impl Pipeline for PerplexityPipeline {
    fn id(&self) -> &str {
        "perplexity"
    }

    fn name(&self) -> &str {
        "Perplexity AI: "
    }

    async fn list_models(&self) -> Vec<ModelDescriptor> {
        self.registry.list().to_vec()
    }

    async fn pipe(&self, request: PipeRequest) -> Result<InvocationResult, LlmError> {
        let options = request.options()?;
        let prompt = request.prompt();
        let model = self.registry.resolve_or_passthrough(&request.model_id)?;
        let chat = ChatRequest::new(request.messages, options, model);
        let body = self.request_transformer.body_for_prompt(&chat, &prompt)?;
        let client = self.client.current().await;

        if chat.options.stream {
            return match client.chat_stream(&body).await {
                Ok(chunks) => Ok(InvocationResult::Stream(decode_text_stream(
                    chunks,
                    self.stream_decoder.clone(),
                ))),
                Err(e) if e.is_transport() => Ok(InvocationResult::failed(self.id(), &e)),
                Err(e) => Err(e),
            };
        }

        match client.chat(&body).await {
            Ok(raw) => Ok(InvocationResult::Text(
                self.response_transformer.extract_text(&raw)?,
            )),
            Err(e) if e.is_transport() => Ok(InvocationResult::failed(self.id(), &e)),
            Err(e) => Err(e),
        }
    }

    async fn on_config_changed(&self) -> Result<(), LlmError> {
        let config = self.config().await;
        self.reconfigure(config).await
    }
}
