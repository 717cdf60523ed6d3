//! DALL·E image generation pipeline.
//!
//! The user message is the prompt. Each generated image is downloaded and
//! saved locally so the chat can show it after the vendor URL expires.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};

use super::config::OpenAiImageConfig;
use super::errors::classify_openai_http_error;
use crate::defaults;
use crate::error::LlmError;
use crate::pipeline::{ClientSlot, InvocationResult, PipeRequest, Pipeline};
use crate::registry::ModelRegistry;
use crate::transformers::request::RequestTransformer;
use crate::types::{ChatRequest, ImageGenerationRequest, ModelDescriptor, Vendor};
use crate::utils::url::{file_name_from_url, join_url};

const PROVIDER_ID: &str = "openai-images";

#[derive(Debug, Clone, Default)]
pub struct ImageRequestTransformer;

impl RequestTransformer for ImageRequestTransformer {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn transform_chat(&self, _req: &ChatRequest) -> Result<Value, LlmError> {
        Err(LlmError::invalid_input(
            "image generation takes a prompt, not a conversation",
        ))
    }

    fn transform_image(&self, req: &ImageGenerationRequest) -> Result<Value, LlmError> {
        if req.prompt.trim().is_empty() {
            return Err(LlmError::invalid_input("image prompt must not be empty"));
        }
        Ok(json!({
            "model": req.model,
            "prompt": req.prompt,
            "size": req.size,
            "n": req.count,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// HTTP client bound to one configuration.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    http_client: reqwest::Client,
    config: OpenAiImageConfig,
}

impl OpenAiImageClient {
    pub fn new(config: OpenAiImageConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(defaults::http::CONNECT_TIMEOUT)
            .user_agent(defaults::http::USER_AGENT)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &OpenAiImageConfig {
        &self.config
    }

    fn auth_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                    .map_err(|e| LlmError::ConfigurationError(format!("Invalid API key: {e}")))?,
            );
        }
        Ok(headers)
    }

    /// Image models offered upstream, filtered to the DALL·E 3 family. Empty
    /// without an API key.
    pub async fn list_image_models(&self) -> Result<Vec<ModelDescriptor>, LlmError> {
        if !self.config.has_api_key() {
            return Ok(Vec::new());
        }
        let url = join_url(&self.config.base_url, "/models");
        let resp = self
            .http_client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_openai_http_error(PROVIDER_ID, status, &text));
        }
        let models: ModelsResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::malformed_response(PROVIDER_ID, e))?;
        Ok(models
            .data
            .into_iter()
            .filter(|m| m.id.contains(defaults::openai::IMAGE_MODEL_MARKER))
            .map(|m| ModelDescriptor::new(m.id.clone(), m.id))
            .collect())
    }

    /// `POST /images/generations`; returns the hosted image URLs.
    pub async fn generate(&self, body: &Value) -> Result<Vec<String>, LlmError> {
        let url = join_url(&self.config.base_url, "/images/generations");
        tracing::debug!(%url, payload = %body, "generating images");
        let resp = self
            .http_client
            .post(url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_openai_http_error(PROVIDER_ID, status, &text));
        }
        let images: ImagesResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::malformed_response(PROVIDER_ID, e))?;
        Ok(images.data.into_iter().filter_map(|image| image.url).collect())
    }

    /// Download one image and render its markdown line.
    ///
    /// A saved image links to `show_dir`; an image that could not be fetched
    /// links to the temporary vendor URL with a warning; an image that was
    /// fetched but could not be written yields nothing.
    pub async fn persist(&self, url: &str) -> String {
        tracing::info!(%url, "image generated");
        let fetched = match self.http_client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp.bytes().await.map_err(LlmError::from),
            Ok(resp) => Err(LlmError::api_error(
                resp.status().as_u16(),
                "image download failed",
            )),
            Err(e) => Err(e.into()),
        };
        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%url, error = %e, "keeping temporary image URL");
                return format!(
                    "![image]({url})\n{}\n",
                    defaults::openai::TEMPORARY_URL_WARNING
                );
            }
        };

        let file_name = file_name_from_url(url)
            .unwrap_or_else(|_| format!("{}.png", uuid::Uuid::new_v4()));
        match save_image(&self.config.save_dir, &file_name, &bytes).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "image saved");
                format!("![image]({})\n", join_url(&self.config.show_dir, &file_name))
            }
            Err(e) => {
                tracing::warn!(%file_name, error = %e, "failed to save image");
                String::new()
            }
        }
    }
}

async fn save_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<std::path::PathBuf, LlmError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[derive(Debug)]
struct ImageHandle {
    client: OpenAiImageClient,
    registry: ModelRegistry,
}

impl ImageHandle {
    async fn connect(config: OpenAiImageConfig) -> Result<Self, LlmError> {
        let client = OpenAiImageClient::new(config)?;
        let models = client.list_image_models().await?;
        tracing::info!(models = models.len(), "image models loaded");
        Ok(Self {
            client,
            registry: ModelRegistry::new(Vendor::OpenAiImages, models),
        })
    }
}

/// Image generation manifold (`openai_image_gen`).
#[derive(Debug)]
pub struct OpenAiImagePipeline {
    transformer: ImageRequestTransformer,
    handle: ClientSlot<ImageHandle>,
}

impl OpenAiImagePipeline {
    /// Build the client and load the model list.
    pub async fn connect(config: OpenAiImageConfig) -> Result<Self, LlmError> {
        Ok(Self {
            transformer: ImageRequestTransformer,
            handle: ClientSlot::new(ImageHandle::connect(config).await?),
        })
    }

    pub async fn from_env() -> Result<Self, LlmError> {
        Self::connect(OpenAiImageConfig::from_env()).await
    }

    pub async fn config(&self) -> OpenAiImageConfig {
        self.handle.current().await.client.config().clone()
    }

    /// Rebuild the client and reload the model list. The previous handle
    /// stays in place if either step fails.
    pub async fn reconfigure(&self, config: OpenAiImageConfig) -> Result<(), LlmError> {
        let handle = ImageHandle::connect(config).await?;
        self.handle.replace(handle).await;
        Ok(())
    }
}

#[async_trait]
impl Pipeline for OpenAiImagePipeline {
    fn id(&self) -> &str {
        "openai_image_gen"
    }

    fn name(&self) -> &str {
        "ImageGen: "
    }

    async fn list_models(&self) -> Vec<ModelDescriptor> {
        self.handle.current().await.registry.list().to_vec()
    }

    async fn pipe(&self, request: PipeRequest) -> Result<InvocationResult, LlmError> {
        let handle = self.handle.current().await;
        let config = handle.client.config();
        let model = handle.registry.resolve_or_passthrough(&request.model_id)?;
        let body = self.transformer.transform_image(&ImageGenerationRequest {
            model: model.target_model_id,
            prompt: request.prompt(),
            size: config.image_size.clone(),
            count: config.num_images,
        })?;

        let urls = match handle.client.generate(&body).await {
            Ok(urls) => urls,
            Err(e) if e.is_transport() => return Ok(InvocationResult::failed(self.id(), &e)),
            Err(e) => return Err(e),
        };

        let mut message = String::new();
        for url in &urls {
            message.push_str(&handle.client.persist(url).await);
        }
        Ok(InvocationResult::Text(message))
    }

    async fn on_config_changed(&self) -> Result<(), LlmError> {
        let config = self.config().await;
        self.reconfigure(config).await
    }
}
