//! OpenAI image generation (DALL·E).

pub mod config;
pub mod errors;
pub mod images;

pub use config::OpenAiImageConfig;
pub use images::{OpenAiImageClient, OpenAiImagePipeline};
