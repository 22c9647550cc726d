//! Vector store trait for storing and searching embedded chunks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// Similarity metric used to score vectors within a collection.
///
/// All metrics score so that larger is more similar, which keeps query
/// results uniformly ordered by descending score across backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Cosine similarity (angle between vectors, magnitude-invariant).
    #[default]
    Cosine,
    /// Raw dot product (magnitude-sensitive).
    DotProduct,
    /// Negated Euclidean distance, so closer vectors score higher.
    Euclidean,
}

impl Metric {
    /// Score `a` against `b`. Both slices must have the same length.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::DotProduct => dot_product(a, b),
            Metric::Euclidean => -euclidean_distance(a, b),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Immutable configuration fixed when a collection is created.
///
/// The `embedding_model` field records which model produced the vectors in
/// the collection; [`RagPipeline::retrieve`] checks it against the live
/// embedder so a collection built with one model is never queried with
/// vectors from another.
///
/// [`RagPipeline::retrieve`]: crate::pipeline::RagPipeline::retrieve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Dimensionality every vector in the collection must have.
    pub dimensions: usize,
    /// Metric used to score queries against stored vectors.
    pub metric: Metric,
    /// Identifier of the embedding model the collection was built with.
    pub embedding_model: String,
}

/// A storage backend for embedded chunks with similarity search.
///
/// Implementations manage named collections. Each collection is created
/// explicitly with a [`CollectionConfig`] that never changes afterwards;
/// entries are added with their vectors and receive store-assigned ids.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::{CollectionConfig, InMemoryVectorStore, Metric, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// let config = CollectionConfig {
///     dimensions: 768,
///     metric: Metric::Cosine,
///     embedding_model: "ibm/slate-125m-english-rtrvr-v2".to_string(),
/// };
/// store.create_collection("docs", config).await?;
/// let ids = store.add("docs", entries).await?;
/// let results = store.query("docs", &query_embedding, 4).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with a fixed configuration.
    ///
    /// Fails with `StoreError` if the collection already exists; a
    /// collection's configuration is frozen at creation and must never be
    /// silently replaced.
    async fn create_collection(&self, name: &str, config: CollectionConfig) -> Result<()>;

    /// Delete a named collection and all its entries.
    ///
    /// Deleting a collection that does not exist is a no-op.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Add chunks with their embedding vectors to a collection.
    ///
    /// The store assigns each entry a unique id and returns the ids in
    /// input order. Fails with `StoreError` if any vector's dimension
    /// differs from the collection's; nothing from the failing batch is
    /// inserted.
    async fn add(&self, collection: &str, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<String>>;

    /// Search for the `top_k` entries most similar to the given vector.
    ///
    /// Returns at most `top_k` results ordered by descending score, ties
    /// broken by insertion order (earlier entry first). An empty
    /// collection yields an empty `Vec`. A query vector with the wrong
    /// dimension fails with `StoreError`.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Fetch a stored chunk by its id, if present.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Chunk>>;

    /// Number of entries in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// The configuration a collection was created with.
    async fn describe(&self, collection: &str) -> Result<CollectionConfig>;
}
