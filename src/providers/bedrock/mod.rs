//! Amazon Bedrock
//!
//! One pipeline type serves both Bedrock families. The family is fixed by the
//! registry's [`Vendor`] and selects the transformer set once at construction.

pub mod anthropic;
pub mod client;
pub mod config;
pub mod errors;
pub mod llama;
pub mod models;
pub mod quick;
pub mod streaming;

use std::sync::Arc;

use async_trait::async_trait;

pub use client::BedrockRuntime;
pub use config::BedrockConfig;
pub use quick::{BedrockModelAlias, SingleMessageRequest, invoke_single_text_message};

use crate::defaults;
use crate::error::LlmError;
use crate::pipeline::{ClientSlot, InvocationResult, PipeRequest, Pipeline};
use crate::registry::ModelRegistry;
use crate::streaming::decode_text_stream;
use crate::transformers::ChatTransformers;
use crate::types::{ChatRequest, ModelDescriptor, Vendor};

/// Transformer set for a Bedrock family.
pub fn transformers_for(vendor: Vendor) -> Result<ChatTransformers, LlmError> {
    match vendor {
        Vendor::BedrockAnthropic => Ok(ChatTransformers {
            request: Arc::new(anthropic::AnthropicRequestTransformer),
            response: Arc::new(anthropic::AnthropicResponseTransformer),
            stream: Arc::new(anthropic::AnthropicChunkDecoder),
        }),
        Vendor::BedrockMeta => Ok(ChatTransformers {
            request: Arc::new(llama::LlamaRequestTransformer),
            response: Arc::new(llama::LlamaResponseTransformer),
            stream: Arc::new(llama::LlamaChunkDecoder),
        }),
        other => Err(LlmError::ConfigurationError(format!(
            "{} is not served by Bedrock",
            other.provider_id()
        ))),
    }
}

/// Config and the runtime built from it, swapped together.
#[derive(Debug)]
struct BedrockHandle {
    config: BedrockConfig,
    runtime: BedrockRuntime,
}

impl BedrockHandle {
    fn build(config: BedrockConfig) -> Result<Self, LlmError> {
        let runtime = BedrockRuntime::new(&config)?;
        Ok(Self { config, runtime })
    }
}

#[derive(Debug)]
pub struct BedrockPipeline {
    id: String,
    name: String,
    registry: ModelRegistry,
    transformers: ChatTransformers,
    handle: ClientSlot<BedrockHandle>,
}

impl BedrockPipeline {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        registry: ModelRegistry,
        config: BedrockConfig,
    ) -> Result<Self, LlmError> {
        let transformers = transformers_for(registry.vendor())?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            registry,
            transformers,
            handle: ClientSlot::new(BedrockHandle::build(config)?),
        })
    }

    /// Anthropic models (`aws_anthropic`).
    pub fn anthropic(config: BedrockConfig) -> Result<Self, LlmError> {
        Self::new(
            "aws_anthropic",
            "AWS Anthropic: ",
            ModelRegistry::new(Vendor::BedrockAnthropic, models::anthropic_models()),
            config,
        )
    }

    /// Anthropic pipeline from the environment. Pinned to the one region that
    /// hosts every listed model.
    pub fn anthropic_from_env() -> Result<Self, LlmError> {
        Self::anthropic(BedrockConfig::from_env().with_region(defaults::anthropic::REGION))
    }

    /// Meta Llama models (`aws_meta`).
    pub fn llama(config: BedrockConfig) -> Result<Self, LlmError> {
        Self::new(
            "aws_meta",
            "AWS Meta: ",
            ModelRegistry::new(Vendor::BedrockMeta, models::llama_models()),
            config,
        )
    }

    pub fn llama_from_env() -> Result<Self, LlmError> {
        Self::llama(BedrockConfig::from_env())
    }

    pub fn vendor(&self) -> Vendor {
        self.registry.vendor()
    }

    pub async fn config(&self) -> BedrockConfig {
        self.handle.current().await.config.clone()
    }

    /// Validate `config`, build a new runtime and swap it in. In-flight calls
    /// finish on the runtime they started with.
    pub async fn reconfigure(&self, config: BedrockConfig) -> Result<(), LlmError> {
        let handle = BedrockHandle::build(config)?;
        tracing::info!(pipeline = %self.id, base_url = %handle.runtime.base_url(), "rebuilt Bedrock client");
        self.handle.replace(handle).await;
        Ok(())
    }
}

#[async_trait]
impl Pipeline for BedrockPipeline {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn list_models(&self) -> Vec<ModelDescriptor> {
        self.registry.list().to_vec()
    }

    async fn pipe(&self, request: PipeRequest) -> Result<InvocationResult, LlmError> {
        let options = request.options()?;
        let model = self.registry.resolve_or_passthrough(&request.model_id)?;
        let chat = ChatRequest::new(request.messages, options, model);
        let body = self.transformers.request.transform_chat(&chat)?;
        let target = chat.model.target_model_id.as_str();

        tracing::debug!(pipeline = %self.id, model = target, stream = chat.options.stream, "pipe");
        let handle = self.handle.current().await;

        if chat.options.stream {
            return match handle
                .runtime
                .invoke_model_with_response_stream(target, &body)
                .await
            {
                Ok(chunks) => Ok(InvocationResult::Stream(decode_text_stream(
                    chunks,
                    self.transformers.stream.clone(),
                ))),
                Err(e) if e.is_transport() => Ok(InvocationResult::failed(&self.id, &e)),
                Err(e) => Err(e),
            };
        }

        match handle.runtime.invoke_model(target, &body).await {
            Ok(raw) => {
                let text = self.transformers.response.extract_text(&raw)?;
                Ok(InvocationResult::Text(text))
            }
            Err(e) if e.is_transport() => Ok(InvocationResult::failed(&self.id, &e)),
            Err(e) => Err(e),
        }
    }

    async fn on_config_changed(&self) -> Result<(), LlmError> {
        let config = self.config().await;
        self.reconfigure(config).await
    }
}
