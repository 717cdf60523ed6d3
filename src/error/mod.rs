//! Error Handling Module
//!
//! One error type, [`LlmError`], is shared by every pipeline. Validation and
//! limit failures are returned as `Err` before any network call; transport
//! failures are classified here so pipelines can turn them into a displayable
//! [`crate::pipeline::InvocationResult::Error`].

mod conversions;
pub mod types;

pub use types::*;
