//! Multimodal content normalization.
//!
//! Walks message content, turning gateway parts into vendor content blocks
//! and enforcing the per-call image policy before anything is sent.

use serde::Serialize;

use crate::defaults::limits::{MAX_IMAGES_PER_CALL, MAX_TOTAL_IMAGE_BYTES};
use crate::error::LlmError;
use crate::types::{ContentPart, ImageSource, MessageContent};

/// Image source in the block shape chat-native vendors expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockImageSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
}

impl From<&ImageSource> for BlockImageSource {
    fn from(source: &ImageSource) -> Self {
        match source {
            ImageSource::Base64 { media_type, data } => Self::Base64 {
                media_type: media_type.clone(),
                data: data.clone(),
            },
            ImageSource::Url { url } => Self::Url { url: url.clone() },
        }
    }
}

/// `{"type": "text", "text": ...}` or `{"type": "image", "source": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: BlockImageSource },
}

/// Running image totals for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageBudget {
    pub count: usize,
    pub total_bytes: u64,
}

impl ImageBudget {
    /// Estimated decoded size: 3/4 of the base64 length; remote URLs count as
    /// zero since their size is unknown until fetched.
    pub fn estimated_size(source: &ImageSource) -> u64 {
        match source {
            ImageSource::Base64 { data, .. } => data.len() as u64 * 3 / 4,
            ImageSource::Url { .. } => 0,
        }
    }

    /// Account for one more image, failing once either ceiling is crossed.
    pub fn admit(&mut self, source: &ImageSource) -> Result<(), LlmError> {
        if self.count >= MAX_IMAGES_PER_CALL {
            return Err(LlmError::LimitExceeded(format!(
                "Maximum of {MAX_IMAGES_PER_CALL} images per API call exceeded"
            )));
        }
        let total = self.total_bytes + Self::estimated_size(source);
        if total > MAX_TOTAL_IMAGE_BYTES {
            return Err(LlmError::LimitExceeded(format!(
                "Total size of images exceeds {} MB limit",
                MAX_TOTAL_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        self.total_bytes = total;
        self.count += 1;
        Ok(())
    }
}

/// Output of [`ContentNormalizer::normalize_parts`] for a standalone list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    pub blocks: Vec<ContentBlock>,
    pub total_image_bytes: u64,
    pub image_count: usize,
}

/// Converts content for one call; the budget spans every message of it.
#[derive(Debug, Default)]
pub struct ContentNormalizer {
    budget: ImageBudget,
}

impl ContentNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn budget(&self) -> ImageBudget {
        self.budget
    }

    /// Normalize one message's content. Plain strings become a single text
    /// block; part order is preserved.
    pub fn normalize(&mut self, content: &MessageContent) -> Result<Vec<ContentBlock>, LlmError> {
        match content {
            MessageContent::Text(text) => Ok(vec![ContentBlock::Text { text: text.clone() }]),
            MessageContent::Parts(parts) => parts.iter().map(|p| self.block(p)).collect(),
        }
    }

    fn block(&mut self, part: &ContentPart) -> Result<ContentBlock, LlmError> {
        match part {
            ContentPart::Text { text } => Ok(ContentBlock::Text { text: text.clone() }),
            ContentPart::Image { source } => {
                self.budget.admit(source)?;
                Ok(ContentBlock::Image {
                    source: source.into(),
                })
            }
        }
    }

    /// Normalize a standalone list of parts with a fresh budget.
    pub fn normalize_parts(parts: &[ContentPart]) -> Result<NormalizedContent, LlmError> {
        let mut normalizer = Self::new();
        let blocks = parts
            .iter()
            .map(|p| normalizer.block(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NormalizedContent {
            blocks,
            total_image_bytes: normalizer.budget.total_bytes,
            image_count: normalizer.budget.count,
        })
    }
}
