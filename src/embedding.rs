//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (watsonx.ai, OpenAI,
/// etc.) behind a unified async interface. The batch call is the required
/// operation because every hosted backend embeds many inputs per request;
/// the default [`embed`](EmbeddingProvider::embed) delegates to it.
///
/// Implementations hold no mutable state between calls beyond a shared HTTP
/// client and cached credentials, so one provider can be `Arc`-shared
/// between the build and query phases.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::EmbeddingProvider;
///
/// let vectors = provider.embed_batch(&["first", "second"]).await?;
/// assert_eq!(vectors.len(), 2);
/// assert_eq!(vectors[0].len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Returns one vector per input, in input order. An empty batch
    /// returns an empty `Vec` without touching the network.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| RagError::EmbeddingError {
            provider: self.model_id().to_string(),
            message: "provider returned no vector for a single-text batch".to_string(),
        })
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// The identifier of the underlying embedding model.
    ///
    /// Frozen into a collection's configuration at creation time and
    /// checked again at query time; vectors from different models share no
    /// meaningful geometry, so a mismatch is an error rather than a
    /// silently degraded search.
    fn model_id(&self) -> &str;
}
