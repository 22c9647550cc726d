//! In-memory vector store with exact linear-scan search.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small-scale use cases.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionConfig, VectorStore};

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Debug)]
struct Collection {
    config: CollectionConfig,
    // Insertion order is the tie-break order for equal scores.
    entries: Vec<Entry>,
}

/// An in-memory vector store with exact (linear-scan) similarity search.
///
/// Collections are held in a `HashMap` behind a `tokio::sync::RwLock`;
/// entries keep their insertion order, which breaks score ties during
/// queries. Each collection's [`CollectionConfig`] is frozen at creation.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::{CollectionConfig, InMemoryVectorStore, Metric, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store
///     .create_collection("docs", CollectionConfig {
///         dimensions: 384,
///         metric: Metric::Cosine,
///         embedding_model: "mock".to_string(),
///     })
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn store_error(message: String) -> RagError {
    RagError::StoreError { backend: "memory".to_string(), message }
}

fn missing_collection(name: &str) -> RagError {
    store_error(format!("collection '{name}' does not exist"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, config: CollectionConfig) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(store_error(format!("collection '{name}' already exists")));
        }
        collections.insert(name.to_string(), Collection { config, entries: Vec::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn add(&self, collection: &str, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<String>> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;

        // Validate the whole batch before inserting anything.
        for (_, vector) in &entries {
            if vector.len() != target.config.dimensions {
                return Err(store_error(format!(
                    "vector dimension {} does not match collection dimension {}",
                    vector.len(),
                    target.config.dimensions
                )));
            }
        }

        let mut ids = Vec::with_capacity(entries.len());
        for (chunk, vector) in entries {
            let id = Uuid::new_v4().to_string();
            ids.push(id.clone());
            target.entries.push(Entry { id, chunk, vector });
        }
        Ok(ids)
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing_collection(collection))?;

        if embedding.len() != target.config.dimensions {
            return Err(store_error(format!(
                "query dimension {} does not match collection dimension {}",
                embedding.len(),
                target.config.dimensions
            )));
        }

        let mut scored: Vec<SearchResult> = target
            .entries
            .iter()
            .map(|entry| {
                let score = target.config.metric.score(&entry.vector, embedding);
                SearchResult { id: entry.id.clone(), chunk: entry.chunk.clone(), score }
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Chunk>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        Ok(target.entries.iter().find(|entry| entry.id == id).map(|entry| entry.chunk.clone()))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        Ok(target.entries.len())
    }

    async fn describe(&self, collection: &str) -> Result<CollectionConfig> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        Ok(target.config.clone())
    }
}
