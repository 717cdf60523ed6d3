//! Streaming
//!
//! A streamed call is exposed as a [`TextStream`]: a lazy, finite,
//! non-restartable sequence of text fragments. The consumer drives decoding by
//! polling; nothing is read ahead in the background. Dropping the stream drops
//! the underlying HTTP response, which closes the connection.
//!
//! Whether the vendor finished cleanly is reported out of band through
//! [`StreamCompletion`], so the text sequence itself carries only text.

pub mod aws_event_stream;
pub mod sse;

use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use futures_util::StreamExt;

use crate::error::LlmError;
use crate::transformers::stream::{StreamChunkTransformer, StreamDelta};

type BoxedTextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Decoded vendor events of one streamed call, before text extraction.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<serde_json::Value, LlmError>> + Send>>;

/// How a stream ended, as far as has been observed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompletionState {
    /// Still being consumed, or abandoned by the consumer.
    #[default]
    Pending,
    /// The vendor sent its terminal event.
    Finished { stop_reason: Option<String> },
    /// The transport closed without a terminal event.
    Truncated,
    /// The transport or vendor reported an error mid-stream.
    Failed(String),
}

/// Shared view of a stream's [`CompletionState`].
#[derive(Debug, Clone, Default)]
pub struct StreamCompletion {
    state: Arc<Mutex<CompletionState>>,
}

impl StreamCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CompletionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state(), CompletionState::Finished { .. })
    }

    fn set(&self, next: CompletionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// A later terminal event without a reason keeps an earlier reason.
    fn finish(&self, stop_reason: Option<String>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let keep = matches!(
            (&*state, &stop_reason),
            (CompletionState::Finished { stop_reason: Some(_) }, None)
        );
        if !keep {
            *state = CompletionState::Finished { stop_reason };
        }
    }

    fn settle_end(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == CompletionState::Pending {
            *state = CompletionState::Truncated;
        }
    }

    fn fail(&self, message: String) {
        self.set(CompletionState::Failed(message));
    }
}

/// Lazy sequence of generated text fragments.
pub struct TextStream {
    inner: BoxedTextStream,
    completion: StreamCompletion,
}

impl TextStream {
    pub fn new(
        inner: impl Stream<Item = Result<String, LlmError>> + Send + 'static,
        completion: StreamCompletion,
    ) -> Self {
        Self {
            inner: Box::pin(inner),
            completion,
        }
    }

    /// A stream over already-known fragments, finished cleanly.
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        let completion = StreamCompletion::new();
        completion.finish(None);
        Self::new(futures::stream::iter(fragments.into_iter().map(Ok)), completion)
    }

    pub fn completion(&self) -> StreamCompletion {
        self.completion.clone()
    }

    /// Drain the stream into one string, stopping at the first error.
    pub async fn collect_text(mut self) -> Result<String, LlmError> {
        let mut out = String::new();
        while let Some(fragment) = self.next().await {
            out.push_str(&fragment?);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream")
            .field("completion", &self.completion.state())
            .finish_non_exhaustive()
    }
}

impl Stream for TextStream {
    type Item = Result<String, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

/// Turn a stream of decoded vendor chunks into a [`TextStream`].
///
/// Empty text fragments are skipped. The first error is yielded once and
/// ends the stream.
pub fn decode_text_stream<S>(chunks: S, transformer: Arc<dyn StreamChunkTransformer>) -> TextStream
where
    S: Stream<Item = Result<serde_json::Value, LlmError>> + Send + 'static,
{
    let completion = StreamCompletion::new();
    let tracker = completion.clone();
    let provider_id = transformer.provider_id().to_string();

    let text = async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        while let Some(item) = chunks.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(provider = %provider_id, error = %e, "stream aborted");
                    tracker.fail(e.to_string());
                    yield Err(e);
                    return;
                }
            };
            for delta in transformer.convert_chunk(&chunk) {
                match delta {
                    StreamDelta::Text(text) if text.is_empty() => {}
                    StreamDelta::Text(text) => {
                        yield Ok(text);
                    }
                    StreamDelta::Finished { stop_reason } => {
                        tracing::debug!(provider = %provider_id, ?stop_reason, "stream finished");
                        tracker.finish(stop_reason);
                    }
                }
            }
        }
        tracker.settle_end();
    };

    TextStream::new(text, completion)
}
