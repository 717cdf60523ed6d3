//! Core Types
//!
//! Request-side types shared by every pipeline: gateway chat messages, the
//! typed generation options projected out of the host body, and model
//! descriptors.

pub mod chat;
pub mod models;
pub mod options;
pub mod request;

pub use chat::*;
pub use models::*;
pub use options::*;
pub use request::*;
