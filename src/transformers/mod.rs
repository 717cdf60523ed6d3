//! Transformers layer
//!
//! Traits for the three reshaping steps every pipeline performs: gateway
//! request to vendor body, vendor envelope to text, and vendor stream chunk
//! to text deltas. Vendor implementations live next to their pipelines under
//! `crate::providers`.

pub mod request;
pub mod response;
pub mod stream;

use std::sync::Arc;

/// The three transformers a chat pipeline dispatches to for one vendor.
#[derive(Clone)]
pub struct ChatTransformers {
    pub request: Arc<dyn request::RequestTransformer>,
    pub response: Arc<dyn response::ResponseTransformer>,
    pub stream: Arc<dyn stream::StreamChunkTransformer>,
}

impl std::fmt::Debug for ChatTransformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTransformers")
            .field("provider_id", &self.request.provider_id())
            .finish()
    }
}
