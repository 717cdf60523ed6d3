//! # manifold-pipelines
//!
//! Pipelines that take a chat request in the gateway shape (OpenAI-style
//! `{role, content}` messages plus a loose options body), adapt it for one
//! vendor API, make a single plain or streamed call, and hand text back.
//!
//! ## Pipelines
//!
//! - [`BedrockPipeline::anthropic`](providers::BedrockPipeline::anthropic): Anthropic models on
//!   Amazon Bedrock, multimodal, streamed over AWS event-stream.
//! - [`BedrockPipeline::llama`](providers::BedrockPipeline::llama): Meta Llama on Bedrock, the
//!   conversation templated into a single prompt.
//! - [`OpenAiImagePipeline`](providers::OpenAiImagePipeline): DALL·E 3, images downloaded and
//!   returned as markdown.
//! - [`PerplexityPipeline`](providers::PerplexityPipeline): web-search-augmented chat.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use manifold_pipelines::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LlmError> {
//!     let pipeline = BedrockPipeline::anthropic_from_env()?;
//!     let request = PipeRequest::from_body(json!({
//!         "model": "anthropic.claude-3-haiku-20240307-v1:0",
//!         "messages": [{"role": "user", "content": "Hello"}],
//!     }))?;
//!     match pipeline.pipe(request).await? {
//!         InvocationResult::Text(text) => println!("{text}"),
//!         InvocationResult::Stream(stream) => println!("{}", stream.collect_text().await?),
//!         InvocationResult::Error(message) => eprintln!("{message}"),
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod defaults;
pub mod error;
pub mod filter;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod transformers;
pub mod types;
pub mod utils;

pub use error::LlmError;

pub mod prelude {
    pub use crate::error::LlmError;
    pub use crate::filter::{Filter, PassthroughFilter};
    pub use crate::pipeline::{InvocationResult, PipeRequest, Pipeline, PipelineKind};
    pub use crate::providers::bedrock::{
        BedrockConfig, BedrockModelAlias, BedrockPipeline, SingleMessageRequest,
        invoke_single_text_message,
    };
    pub use crate::providers::openai::{OpenAiImageConfig, OpenAiImagePipeline};
    pub use crate::providers::perplexity::{PerplexityConfig, PerplexityPipeline};
    pub use crate::streaming::{CompletionState, StreamCompletion, TextStream};
    pub use crate::types::{ChatMessage, ContentPart, GenerationOptions, ModelDescriptor};
}
