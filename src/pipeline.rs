//! Pipeline orchestrator for document question answering.
//!
//! The [`RagPipeline`] coordinates the full workflow by composing an
//! [`EmbeddingProvider`], a [`VectorStore`], and a [`TextGenerator`]:
//! ingestion (load → chunk → embed → store) and answering (embed →
//! retrieve → prompt → generate).
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! pipeline.create_collection("docs").await?;
//! pipeline.ingest_file("docs", Path::new("paper.pdf")).await?;
//! let answer = pipeline.answer("docs", "What is the main finding?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{error, info};

use crate::chunking::TextChunker;
use crate::config::RagConfig;
use crate::document::{Answer, Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::loader::load_document;
use crate::retry::retry;
use crate::vectorstore::{CollectionConfig, VectorStore};

/// Guidance prepended to every generation prompt.
const PROMPT_GUIDANCE: &str = "You are an assistant that answers questions using only the \
provided context. If the context does not contain the answer, say so explicitly.";

/// The pipeline orchestrator.
///
/// Coordinates document ingestion (load → chunk → embed → store) and
/// question answering (embed → retrieve → prompt → generate). Construct
/// one via [`RagPipeline::builder()`]. Every operation is stateless; no
/// conversation history is kept between calls.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    generator: Arc<dyn TextGenerator>,
    chunker: TextChunker,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Create a named collection sized for the configured embedder.
    ///
    /// The collection records the embedder's dimensionality and model id
    /// plus the configured metric; [`retrieve`](Self::retrieve) later
    /// checks the model id so collections are never queried with vectors
    /// from a different model.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let config = CollectionConfig {
            dimensions: self.embedding_provider.dimensions(),
            metric: self.config.metric,
            embedding_model: self.embedding_provider.model_id().to_string(),
        };
        self.vector_store.create_collection(name, config).await.inspect_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
        })?;
        info!(collection = name, "created collection");
        Ok(())
    }

    /// Delete a named collection and everything in it.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.inspect_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
        })
    }

    /// Load a file and ingest it: load → chunk → embed → store.
    ///
    /// Returns the store-assigned entry ids in chunk order. Loader and
    /// chunker failures abort before anything is written; embedding
    /// failures are retried per the configured policy and abort before
    /// the store is touched.
    pub async fn ingest_file(&self, collection: &str, path: &Path) -> Result<Vec<String>> {
        let document = load_document(path)?;
        self.ingest(collection, &document).await
    }

    /// Ingest an already loaded document: chunk → embed → store.
    ///
    /// Returns the store-assigned entry ids in chunk order.
    pub async fn ingest(&self, collection: &str, document: &Document) -> Result<Vec<String>> {
        let chunks = self.chunker.chunk(document);
        let embeddings = self.embed_chunk_texts(&chunks).await.inspect_err(|e| {
            error!(document = %document.source, error = %e, "embedding failed during ingestion");
        })?;

        let entries: Vec<(Chunk, Vec<f32>)> = chunks.into_iter().zip(embeddings).collect();
        let ids = self.vector_store.add(collection, entries).await.inspect_err(|e| {
            error!(document = %document.source, error = %e, "store add failed during ingestion");
        })?;

        info!(
            collection,
            document = %document.source,
            chunk_count = ids.len(),
            "ingested document"
        );
        Ok(ids)
    }

    /// Embed chunk texts in batches, several batches in flight at once.
    ///
    /// `buffered` yields results in input order regardless of completion
    /// order, so the i-th vector always belongs to the i-th chunk.
    async fn embed_chunk_texts(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(
            texts.chunks(self.config.embed_batch_size).map(|batch| async move {
                retry(&self.config.retry, "embed_batch", || {
                    self.embedding_provider.embed_batch(batch)
                })
                .await
            }),
        )
        .buffered(self.config.embed_concurrency)
        .try_collect()
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    /// Retrieve the chunks most relevant to a question.
    ///
    /// Embeds the question and queries the collection for the configured
    /// `top_k`, filtering by `score_threshold` when one is set. Fails with
    /// `StoreError` if the collection was built with a different embedding
    /// model than the pipeline's.
    pub async fn retrieve(&self, collection: &str, question: &str) -> Result<Vec<SearchResult>> {
        let collection_config = self.vector_store.describe(collection).await?;
        let model_id = self.embedding_provider.model_id();
        if collection_config.embedding_model != model_id {
            return Err(RagError::StoreError {
                backend: "pipeline".to_string(),
                message: format!(
                    "collection '{collection}' was built with embedding model '{}', \
                     but the configured embedder is '{model_id}'",
                    collection_config.embedding_model
                ),
            });
        }

        let query_embedding = retry(&self.config.retry, "embed_query", || {
            self.embedding_provider.embed(question)
        })
        .await
        .inspect_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
        })?;

        let mut results =
            self.vector_store.query(collection, &query_embedding, self.config.top_k).await?;
        if let Some(threshold) = self.config.score_threshold {
            results.retain(|r| r.score >= threshold);
        }
        Ok(results)
    }

    /// Answer a question from the documents in a collection.
    ///
    /// Retrieves the most relevant chunks, builds a single prompt from
    /// them, and asks the generator. The generated text is returned
    /// verbatim together with the retrieved chunks as provenance. An
    /// empty retrieval still generates; the guidance makes the model say
    /// the context does not contain the answer.
    pub async fn answer(&self, collection: &str, question: &str) -> Result<Answer> {
        let sources = self.retrieve(collection, question).await?;
        let prompt = build_prompt(&sources, question);

        let generation =
            retry(&self.config.retry, "generate", || self.generator.generate(&prompt))
                .await
                .inspect_err(|e| {
                    error!(error = %e, "generation failed");
                })?;

        info!(
            collection,
            source_count = sources.len(),
            model = %generation.model_id,
            "answered question"
        );
        Ok(Answer { text: generation.text, sources })
    }
}

/// Compose the generation prompt: guidance, ranked context, question.
fn build_prompt(sources: &[SearchResult], question: &str) -> String {
    let mut prompt = String::from(PROMPT_GUIDANCE);
    prompt.push_str("\n\nContext:\n");
    for (i, result) in sources.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n\n", i + 1, result.chunk.text));
    }
    prompt.push_str(&format!("Question: {question}\nAnswer:"));
    prompt
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider, vector store, and generator are required; the
/// config defaults to [`RagConfig::default()`] when unset.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(config)
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .generator(Arc::new(generator))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the text generator.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagPipeline`], validating that all required parts are
    /// set and that the chunking parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required part is missing or
    /// the config rejects its chunking parameters.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap)?;

        Ok(RagPipeline { config, embedding_provider, vector_store, generator, chunker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult {
            id: "id".to_string(),
            chunk: Chunk { text: text.to_string(), page: 0, offset: 0 },
            score,
        }
    }

    #[test]
    fn prompt_lists_sources_in_rank_order() {
        let sources = vec![result("first passage", 0.9), result("second passage", 0.5)];
        let prompt = build_prompt(&sources, "what happened?");
        let first = prompt.find("first passage").unwrap();
        let second = prompt.find("second passage").unwrap();
        assert!(first < second);
        assert!(prompt.starts_with(PROMPT_GUIDANCE));
        assert!(prompt.ends_with("Question: what happened?\nAnswer:"));
    }

    #[test]
    fn prompt_without_sources_still_carries_the_question() {
        let prompt = build_prompt(&[], "anyone home?");
        assert!(prompt.contains("Context:"));
        assert!(prompt.contains("Question: anyone home?"));
    }

    #[test]
    fn builder_requires_all_parts() {
        let result = RagPipeline::builder().build();
        assert!(matches!(result, Err(RagError::ConfigError(_))));
    }
}
