//! Default Configuration Values
//!
//! This module centralizes the default values used by the pipelines so the
//! documented vendor defaults live in one place.

use std::time::Duration;

/// HTTP client default configurations
pub mod http {
    use super::*;

    /// Default request timeout for vendor calls.
    ///
    /// Large models can take well over ten seconds before the first byte, and
    /// image generation is slower still.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("manifold-pipelines/", env!("CARGO_PKG_VERSION"));
}

/// Per-call image policy for multimodal chat payloads.
pub mod limits {
    /// Maximum number of images in a single call.
    pub const MAX_IMAGES_PER_CALL: usize = 5;

    /// Maximum cumulative estimated decoded image size (100 MiB).
    pub const MAX_TOTAL_IMAGE_BYTES: u64 = 100 * 1024 * 1024;
}

/// Chat-native family (Anthropic on Bedrock).
pub mod anthropic {
    pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
    pub const MAX_TOKENS: u32 = 4096;
    pub const TEMPERATURE: f64 = 0.8;
    pub const TOP_P: f64 = 0.9;
    pub const TOP_K: u32 = 40;
    /// Sonnet 3.5 is only hosted here.
    pub const REGION: &str = "us-east-1";
}

/// Continuation-style family (Meta Llama on Bedrock).
pub mod llama {
    pub const MAX_GEN_LEN: u32 = 2048;
    pub const TEMPERATURE: f64 = 0.8;
    pub const TOP_P: f64 = 0.9;

    /// Synthetic first turn describing the role convention of the templated
    /// prompt.
    pub const ROLE_CONVENTION_PROMPT: &str = "You are an AI assistant. You will receive messages structured as follows: \
each message has a 'role' indicating if it's from 'user' or 'assistant', \
and 'content' containing the actual message. \
Please respond appropriately based on this structure.\
When you respond, do not include the role tag, only the content. Since you will always be the assistant";

    pub const END_OF_TURN: &str = "<|eot_id|>";
}

pub mod bedrock {
    pub const SERVICE: &str = "bedrock-runtime";
    pub const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";
}

pub mod openai {
    pub const BASE_URL: &str = "https://api.openai.com/v1";
    pub const IMAGE_SIZE: &str = "1024x1024";
    pub const NUM_IMAGES: u32 = 1;
    /// Only the DALL-E 3 family is offered.
    pub const IMAGE_MODEL_MARKER: &str = "dall-e-3";
    /// Where downloaded images are written.
    pub const SAVE_DIR: &str = "/app/image_generations";
    /// Where the web front end serves them from.
    pub const SHOW_DIR: &str = "/cache/image/generations";
    pub const TEMPORARY_URL_WARNING: &str =
        "⚠️ This is a temporary URL. Please download the image. ⚠️";
}

pub mod perplexity {
    pub const BASE_URL: &str = "https://api.perplexity.ai";
    pub const SYSTEM_PROMPT: &str = "Be precise and concise";
}

/// Keys of the host request body that belong to the host, never to a vendor.
pub const BOOKKEEPING_FIELDS: &[&str] = &["user", "chat_id", "title"];
