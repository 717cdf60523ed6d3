//! OpenAI image generation configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::defaults;
use crate::error::LlmError;
use crate::observability::mask_secret;

pub const ENV_BASE_URL: &str = "OPENAI_API_BASE_URL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_IMAGE_SIZE: &str = "IMAGE_SIZE";
pub const ENV_NUM_IMAGES: &str = "NUM_IMAGES";

#[derive(Clone)]
pub struct OpenAiImageConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    /// `WIDTHxHEIGHT`, e.g. `1024x1024`.
    pub image_size: String,
    pub num_images: u32,
    /// Where downloaded images are written.
    pub save_dir: PathBuf,
    /// Path prefix the front end serves saved images under.
    pub show_dir: String,
    pub timeout: Duration,
}

impl Default for OpenAiImageConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::openai::BASE_URL.to_string(),
            api_key: None,
            image_size: defaults::openai::IMAGE_SIZE.to_string(),
            num_images: defaults::openai::NUM_IMAGES,
            save_dir: PathBuf::from(defaults::openai::SAVE_DIR),
            show_dir: defaults::openai::SHOW_DIR.to_string(),
            timeout: defaults::http::REQUEST_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for OpenAiImageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImageConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|k| mask_secret(k.expose_secret())),
            )
            .field("image_size", &self.image_size)
            .field("num_images", &self.num_images)
            .field("save_dir", &self.save_dir)
            .field("show_dir", &self.show_dir)
            .finish()
    }
}

impl OpenAiImageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `OPENAI_API_BASE_URL`, `OPENAI_API_KEY`,
    /// `IMAGE_SIZE` and `NUM_IMAGES`.
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
        if let Ok(size) = std::env::var(ENV_IMAGE_SIZE)
            && !size.is_empty()
        {
            config.image_size = size;
        }
        if let Ok(raw) = std::env::var(ENV_NUM_IMAGES) {
            match raw.parse() {
                Ok(n) => config.num_images = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {ENV_NUM_IMAGES}"),
            }
        }
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

    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        self.image_size = size.into();
        self
    }

    pub fn with_num_images(mut self, n: u32) -> Self {
        self.num_images = n;
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    pub fn with_show_dir(mut self, dir: impl Into<String>) -> Self {
        self.show_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        url::Url::parse(&self.base_url)
            .map_err(|e| LlmError::ConfigurationError(format!("invalid OpenAI base URL: {e}")))?;
        let valid_size = self
            .image_size
            .split_once('x')
            .is_some_and(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok());
        if !valid_size {
            return Err(LlmError::ConfigurationError(format!(
                "image size `{}` is not WIDTHxHEIGHT",
                self.image_size
            )));
        }
        if self.num_images == 0 {
            return Err(LlmError::ConfigurationError(
                "num_images must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
