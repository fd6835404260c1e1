//! Generation Service Trait
//!
//! The three call shapes the plan pipeline needs from a text-generation
//! backend: one-shot classification, one-shot schema-constrained JSON, and
//! an incremental token stream.

use async_trait::async_trait;
use itinera_core::DraftItinerary;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::stream::TokenStream;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Model identifier used for every call.
    fn model(&self) -> &str;

    /// Classify a request into an intent label.
    ///
    /// The label is the model's trimmed text, not validated against
    /// [`crate::intent::INTENT_LABELS`]. Fails on an empty response.
    async fn classify_intent(&self, text: &str) -> Result<String>;

    /// Run a schema-constrained generation returning a draft itinerary.
    ///
    /// Unparsable output is reported as
    /// [`crate::GenerationError::UnparsableOutput`] with the raw text; a
    /// draft with no stops is [`crate::GenerationError::EmptyDraft`].
    async fn generate_structured_itinerary(&self, prompt: &str) -> Result<DraftItinerary>;

    /// Open a token stream for `prompt`.
    ///
    /// Returns once the upstream connection is open. An upstream error after
    /// that ends the stream early without surfacing an error. Cancelling
    /// `cancel`, or dropping the returned stream, releases the connection.
    async fn stream_plan(&self, prompt: &str, cancel: CancellationToken) -> Result<TokenStream>;
}
