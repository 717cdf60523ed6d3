//! Perplexity models. The API has no listing endpoint.

use crate::types::ModelDescriptor;

pub const SONAR_SMALL_ONLINE: &str = "llama-3.1-sonar-small-128k-online";

pub fn perplexity_models() -> Vec<ModelDescriptor> {
    vec![ModelDescriptor::new(
        SONAR_SMALL_ONLINE,
        "Llama 3.1 Sonar Small 128k Online",
    )]
}
