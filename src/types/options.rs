//! Generation options.
//!
//! The host passes a loose JSON body that mixes generation knobs with its own
//! bookkeeping (`user`, `chat_id`, `title`, ...). [`GenerationOptions`] is an
//! allow-list projection of that body: only the fields below ever reach a
//! vendor payload.

use serde::{Deserialize, Deserializer, Serialize};

use crate::defaults::BOOKKEEPING_FIELDS;
use crate::error::LlmError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// OpenAI-style `stop`; accepts a single string or a list.
    #[serde(
        default,
        alias = "stop_sequences",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub stream: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
    })
}

impl GenerationOptions {
    /// Project the host request body onto the typed options.
    pub fn from_body(body: &serde_json::Value) -> Result<Self, LlmError> {
        let Some(obj) = body.as_object() else {
            return Ok(Self::default());
        };
        let dropped: Vec<&str> = BOOKKEEPING_FIELDS
            .iter()
            .copied()
            .filter(|k| obj.contains_key(*k))
            .collect();
        if !dropped.is_empty() {
            tracing::debug!(fields = ?dropped, "dropping host bookkeeping fields");
        }
        serde_json::from_value(body.clone())
            .map_err(|e| LlmError::invalid_input(format!("invalid generation options: {e}")))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}
