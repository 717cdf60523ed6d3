//! Filter pipelines.
//!
//! A filter sits in front of (`inlet`) and behind (`outlet`) the chat pipelines
//! and may rewrite the raw request or response body.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LlmError;

#[async_trait]
pub trait Filter: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Pipeline ids this filter attaches to; `"*"` matches all.
    fn pipelines(&self) -> &[String];

    /// Lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    fn applies_to(&self, pipeline_id: &str) -> bool {
        self.pipelines()
            .iter()
            .any(|p| p == "*" || p == pipeline_id)
    }

    /// Runs before the request reaches a pipeline.
    async fn inlet(&self, body: Value, user: Option<&Value>) -> Result<Value, LlmError>;

    /// Runs on the response body after the pipeline answered.
    async fn outlet(&self, body: Value, user: Option<&Value>) -> Result<Value, LlmError>;
}

/// Filter that logs and returns bodies untouched.
#[derive(Debug, Clone)]
pub struct PassthroughFilter {
    id: String,
    name: String,
    pipelines: Vec<String>,
    priority: i32,
}

impl Default for PassthroughFilter {
    fn default() -> Self {
        Self {
            id: "filter_pipeline".to_string(),
            name: "Filter".to_string(),
            pipelines: vec!["*".to_string()],
            priority: 0,
        }
    }
}

impl PassthroughFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipelines(mut self, pipelines: Vec<String>) -> Self {
        self.pipelines = pipelines;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl Filter for PassthroughFilter {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pipelines(&self) -> &[String] {
        &self.pipelines
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn inlet(&self, body: Value, user: Option<&Value>) -> Result<Value, LlmError> {
        tracing::debug!(filter = %self.id, ?user, "inlet");
        Ok(body)
    }

    async fn outlet(&self, body: Value, user: Option<&Value>) -> Result<Value, LlmError> {
        tracing::debug!(filter = %self.id, ?user, "outlet");
        Ok(body)
    }
}
