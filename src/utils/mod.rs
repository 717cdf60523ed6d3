//! Utility modules
//!
//! Helpers shared by several pipelines.

pub mod multimodal;
pub mod url;

pub use multimodal::{ContentBlock, ContentNormalizer, ImageBudget, NormalizedContent};
pub use self::url::{file_name_from_url, join_url};
