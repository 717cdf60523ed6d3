//! Host-facing pipeline contract.
//!
//! A pipeline lists the models it serves and answers one chat call at a time.
//! Vendor client handles live in a [`ClientSlot`] so a configuration change can
//! swap them while calls are in flight.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::LlmError;
use crate::streaming::TextStream;
use crate::types::{ChatMessage, GenerationOptions, ModelDescriptor, last_user_message};

/// How the host presents a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Serves several models under one pipeline id.
    Manifold,
    /// Rewrites bodies around other pipelines.
    Filter,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifold => "manifold",
            Self::Filter => "filter",
        }
    }
}

/// One inbound call from the host.
#[derive(Debug, Clone)]
pub struct PipeRequest {
    /// Text of the latest user turn, as extracted by the host.
    pub user_message: String,
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
    /// Loose options body; see [`GenerationOptions::from_body`].
    pub body: Value,
}

impl PipeRequest {
    pub fn new(
        user_message: impl Into<String>,
        model_id: impl Into<String>,
        messages: Vec<ChatMessage>,
        body: Value,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            model_id: model_id.into(),
            messages,
            body,
        }
    }

    /// Build a request from a host body carrying `model` and `messages`.
    pub fn from_body(body: Value) -> Result<Self, LlmError> {
        let model_id = body
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::invalid_input("missing `model`"))?
            .to_string();
        let messages = ChatMessage::parse_list(
            body.get("messages")
                .cloned()
                .ok_or_else(|| LlmError::invalid_input("missing `messages`"))?,
        )?;
        let user_message = last_user_message(&messages).unwrap_or_default();
        Ok(Self {
            user_message,
            model_id,
            messages,
            body,
        })
    }

    pub fn options(&self) -> Result<GenerationOptions, LlmError> {
        GenerationOptions::from_body(&self.body)
    }

    /// The explicit user message, or the last user turn when the host left it
    /// empty.
    pub fn prompt(&self) -> String {
        if self.user_message.is_empty() {
            last_user_message(&self.messages).unwrap_or_default()
        } else {
            self.user_message.clone()
        }
    }
}

/// What a pipeline hands back to the host.
#[derive(Debug)]
pub enum InvocationResult {
    Text(String),
    Stream(TextStream),
    /// Vendor or transport failure rendered for display.
    Error(String),
}

impl InvocationResult {
    /// Render a failed vendor call the way the host shows it.
    pub fn failed(pipeline_id: &str, error: &LlmError) -> Self {
        tracing::warn!(pipeline = %pipeline_id, error = %error, "vendor call failed");
        Self::Error(format!("Error: {error}"))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Collapse to a string, draining a stream if needed.
    pub async fn into_text(self) -> Result<String, LlmError> {
        match self {
            Self::Text(text) | Self::Error(text) => Ok(text),
            Self::Stream(stream) => stream.collect_text().await,
        }
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn id(&self) -> &str;

    /// Display prefix shown before model names.
    fn name(&self) -> &str;

    fn kind(&self) -> PipelineKind {
        PipelineKind::Manifold
    }

    async fn list_models(&self) -> Vec<ModelDescriptor>;

    /// Answer one chat call.
    ///
    /// Validation, policy and response-contract failures are `Err`. Failures
    /// of the vendor call itself come back as [`InvocationResult::Error`].
    async fn pipe(&self, request: PipeRequest) -> Result<InvocationResult, LlmError>;

    async fn on_startup(&self) -> Result<(), LlmError> {
        tracing::info!(pipeline = %self.id(), "on_startup");
        Ok(())
    }

    async fn on_shutdown(&self) -> Result<(), LlmError> {
        tracing::info!(pipeline = %self.id(), "on_shutdown");
        Ok(())
    }

    /// Rebuild vendor client handles from the current configuration.
    async fn on_config_changed(&self) -> Result<(), LlmError>;
}

/// Reconfigurable handle to a vendor client.
///
/// Calls clone the inner `Arc` and release the lock before doing I/O.
#[derive(Debug)]
pub struct ClientSlot<T> {
    inner: RwLock<Arc<T>>,
}

impl<T> ClientSlot<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(Arc::new(value)),
        }
    }

    pub async fn current(&self) -> Arc<T> {
        self.inner.read().await.clone()
    }

    /// Swap in a fully built handle; returns the previous one.
    pub async fn replace(&self, value: T) -> Arc<T> {
        let mut guard = self.inner.write().await;
        std::mem::replace(&mut *guard, Arc::new(value))
    }
}
