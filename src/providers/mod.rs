//! Vendor pipelines
//!
//! Each vendor module holds its configuration, HTTP client, transformers and
//! the [`Pipeline`](crate::pipeline::Pipeline) implementation built on them.

pub mod bedrock;
pub mod openai;
pub mod perplexity;

pub use bedrock::{BedrockConfig, BedrockPipeline};
pub use openai::{OpenAiImageConfig, OpenAiImagePipeline};
pub use perplexity::{PerplexityConfig, PerplexityPipeline};
