//! Model Registry
//!
//! Per-vendor, ordered list of selectable models. Built once when a pipeline is
//! constructed and replaced only on reconfiguration.

use crate::error::LlmError;
use crate::types::{ModelDescriptor, Vendor};

/// Separator between an upstream model id and a prompt variant,
/// e.g. `anthropic.claude-3-5-sonnet-20240620-v1:0__video_hook`.
pub const VARIANT_SEPARATOR: &str = "__";

/// Result of looking a model id up in a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub descriptor: ModelDescriptor,
    /// Id sent to the vendor: the matched id without any `__variant` suffix.
    pub target_model_id: String,
    pub vendor: Vendor,
}

impl ResolvedModel {
    pub fn system_prompt(&self) -> Option<&str> {
        self.descriptor.system_prompt.as_deref()
    }
}

/// Ordered, immutable set of model descriptors for one vendor.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    vendor: Vendor,
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    pub fn new(vendor: Vendor, models: Vec<ModelDescriptor>) -> Self {
        Self { vendor, models }
    }

    pub fn empty(vendor: Vendor) -> Self {
        Self::new(vendor, Vec::new())
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve a requested model id.
    ///
    /// Lookup order: exact id, then the base id of a `base__variant` request,
    /// then the first registered id the request is a prefix of.
    pub fn resolve(&self, model_id: &str) -> Option<ResolvedModel> {
        if model_id.is_empty() {
            return None;
        }
        let base_id = strip_variant(model_id);

        let descriptor = self
            .models
            .iter()
            .find(|m| m.id == model_id)
            .or_else(|| {
                (base_id != model_id)
                    .then(|| self.models.iter().find(|m| m.id == base_id))
                    .flatten()
            })
            .or_else(|| self.models.iter().find(|m| m.id.starts_with(model_id)))?;

        Some(ResolvedModel {
            target_model_id: strip_variant(&descriptor.id).to_string(),
            descriptor: descriptor.clone(),
            vendor: self.vendor,
        })
    }

    /// Like [`resolve`](Self::resolve), but an unregistered id is passed
    /// through to the vendor as-is with no fixed prompt.
    pub fn resolve_or_passthrough(&self, model_id: &str) -> Result<ResolvedModel, LlmError> {
        if model_id.trim().is_empty() {
            return Err(LlmError::invalid_input("model id must not be empty"));
        }
        Ok(self.resolve(model_id).unwrap_or_else(|| {
            tracing::debug!(model_id, vendor = ?self.vendor, "model not registered, passing through");
            ResolvedModel {
                descriptor: ModelDescriptor::new(model_id, model_id),
                target_model_id: strip_variant(model_id).to_string(),
                vendor: self.vendor,
            }
        }))
    }
}

/// Upstream id of a possibly variant-suffixed model id.
pub fn strip_variant(model_id: &str) -> &str {
    model_id
        .split_once(VARIANT_SEPARATOR)
        .map(|(base, _)| base)
        .unwrap_or(model_id)
}
