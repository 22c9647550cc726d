//! Chroma vector store backed by the Chroma REST API.
//!
//! This module is only available when the `chroma` feature is enabled.
//! It talks to Chroma's HTTP API directly with `reqwest` rather than
//! through a wrapper crate.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionConfig, Metric, VectorStore};

fn store_error(message: String) -> RagError {
    RagError::StoreError { backend: "chroma".to_string(), message }
}

fn missing_collection(name: &str) -> RagError {
    store_error(format!("collection '{name}' does not exist"))
}

/// The `hnsw:space` value Chroma uses for each metric.
fn chroma_space(metric: Metric) -> &'static str {
    match metric {
        Metric::Cosine => "cosine",
        Metric::DotProduct => "ip",
        Metric::Euclidean => "l2",
    }
}

/// Convert a Chroma distance into this crate's descending-similarity score.
///
/// Chroma reports `1 - similarity` for the cosine and inner-product spaces
/// and squared L2 distance for the `l2` space.
fn score_from_distance(metric: Metric, distance: f32) -> f32 {
    match metric {
        Metric::Cosine | Metric::DotProduct => 1.0 - distance,
        Metric::Euclidean => -distance.max(0.0).sqrt(),
    }
}

fn chunk_from_parts(text: String, metadata: Option<&Value>) -> Chunk {
    let page = metadata.and_then(|m| m.get("page")).and_then(Value::as_u64).unwrap_or(0) as usize;
    let offset =
        metadata.and_then(|m| m.get("offset")).and_then(Value::as_u64).unwrap_or(0) as usize;
    Chunk { text, page, offset }
}

fn config_from_metadata(name: &str, metadata: Option<&Value>) -> Result<CollectionConfig> {
    let metadata = metadata
        .ok_or_else(|| store_error(format!("collection '{name}' carries no metadata")))?;
    let dimensions = metadata.get("dimensions").and_then(Value::as_u64).ok_or_else(|| {
        store_error(format!("collection '{name}' metadata has no 'dimensions' field"))
    })? as usize;
    let metric = match metadata.get("metric") {
        Some(value) => serde_json::from_value::<Metric>(value.clone()).map_err(|e| {
            store_error(format!("collection '{name}' has an invalid 'metric' field: {e}"))
        })?,
        None => Metric::Cosine,
    };
    let embedding_model = metadata
        .get("embedding_model")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(CollectionConfig { dimensions, metric, embedding_model })
}

// ── Chroma API response types ──────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct CollectionInfo {
    id: String,
    name: String,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Value>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Value>>>,
}

#[derive(Debug, Clone)]
struct CachedCollection {
    id: String,
    config: CollectionConfig,
}

/// A [`VectorStore`] backed by a Chroma server over HTTP.
///
/// Each collection's [`CollectionConfig`] is persisted in the Chroma
/// collection metadata at creation and read back on demand; the
/// name-to-id mapping is cached per client. Distances reported by the
/// server are converted to this crate's descending-similarity scores.
/// Score ties are ordered by the server, not by insertion.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::chroma::ChromaVectorStore;
///
/// let store = ChromaVectorStore::new("http://localhost:8000")?;
/// store.create_collection("docs", config).await?;
/// ```
pub struct ChromaVectorStore {
    http: reqwest::Client,
    base_url: String,
    tenant: String,
    database: String,
    cache: RwLock<HashMap<String, CachedCollection>>,
}

impl ChromaVectorStore {
    /// Create a client for a Chroma server, using the default tenant and
    /// database.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Use a tenant other than `default_tenant`.
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    /// Use a database other than `default_database`.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v1/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let response = self
            .http
            .get(self.collections_url())
            .send()
            .await
            .map_err(|e| store_error(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(store_error(format!("list collections failed: {}", response.status())));
        }
        response.json().await.map_err(|e| {
            store_error(format!("failed to parse collection list: {e}"))
        })
    }

    /// Resolve a collection name to its server id and frozen config,
    /// consulting the cache first.
    async fn resolve(&self, name: &str) -> Result<CachedCollection> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(name) {
                return Ok(cached.clone());
            }
        }

        let collections = self.list_collections().await?;
        let info = collections
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| missing_collection(name))?;
        let config = config_from_metadata(name, info.metadata.as_ref())?;
        let cached = CachedCollection { id: info.id, config };
        self.cache.write().await.insert(name.to_string(), cached.clone());
        Ok(cached)
    }

    async fn post_to_collection(&self, id: &str, op: &str, body: &Value) -> Result<reqwest::Response> {
        self.http
            .post(format!("{}/api/v1/collections/{id}/{op}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| store_error(format!("request failed: {e}")))
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn create_collection(&self, name: &str, config: CollectionConfig) -> Result<()> {
        let body = json!({
            "name": name,
            "get_or_create": false,
            "metadata": {
                "dimensions": config.dimensions,
                "metric": serde_json::to_value(config.metric)
                    .map_err(|e| store_error(format!("failed to encode metric: {e}")))?,
                "embedding_model": config.embedding_model,
                "hnsw:space": chroma_space(config.metric),
            },
        });

        let response = self
            .http
            .post(self.collections_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| store_error(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(store_error(format!("create collection failed ({status}): {text}")));
        }

        let info: CollectionInfo = response.json().await.map_err(|e| {
            store_error(format!("failed to parse create response: {e}"))
        })?;
        info!(collection = %name, id = %info.id, "created collection");
        self.cache
            .write()
            .await
            .insert(name.to_string(), CachedCollection { id: info.id, config });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/{name}", self.collections_url()))
            .send()
            .await
            .map_err(|e| store_error(format!("request failed: {e}")))?;

        let status = response.status();
        // Absent collections delete as a no-op.
        if status.is_success() || status.as_u16() == 404 {
            self.cache.write().await.remove(name);
            info!(collection = %name, "deleted collection");
            Ok(())
        } else {
            Err(store_error(format!("delete collection failed: {status}")))
        }
    }

    async fn add(&self, collection: &str, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<String>> {
        let target = self.resolve(collection).await?;

        for (_, vector) in &entries {
            if vector.len() != target.config.dimensions {
                return Err(store_error(format!(
                    "vector dimension {} does not match collection dimension {}",
                    vector.len(),
                    target.config.dimensions
                )));
            }
        }
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(entries.len());
        let mut documents = Vec::with_capacity(entries.len());
        let mut embeddings = Vec::with_capacity(entries.len());
        let mut metadatas = Vec::with_capacity(entries.len());
        for (chunk, vector) in entries {
            ids.push(Uuid::new_v4().to_string());
            metadatas.push(json!({ "page": chunk.page, "offset": chunk.offset }));
            documents.push(chunk.text);
            embeddings.push(vector);
        }

        let body = json!({
            "ids": ids,
            "documents": documents,
            "embeddings": embeddings,
            "metadatas": metadatas,
        });
        let response = self.post_to_collection(&target.id, "add", &body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(store_error(format!("add failed ({status}): {text}")));
        }

        info!(collection = %collection, count = ids.len(), "added entries");
        Ok(ids)
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let target = self.resolve(collection).await?;

        if embedding.len() != target.config.dimensions {
            return Err(store_error(format!(
                "query dimension {} does not match collection dimension {}",
                embedding.len(),
                target.config.dimensions
            )));
        }

        debug!(collection = %collection, top_k, "querying collection");
        let body = json!({
            "query_embeddings": [embedding],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });
        let response = self.post_to_collection(&target.id, "query", &body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(store_error(format!("query failed ({status}): {text}")));
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| {
            store_error(format!("failed to parse query response: {e}"))
        })?;

        let ids = parsed.ids.into_iter().next().unwrap_or_default();
        let documents =
            parsed.documents.and_then(|d| d.into_iter().next()).unwrap_or_default();
        let metadatas =
            parsed.metadatas.and_then(|m| m.into_iter().next()).unwrap_or_default();
        let distances =
            parsed.distances.and_then(|d| d.into_iter().next()).unwrap_or_default();

        let mut results = Vec::with_capacity(ids.len());
        for (i, id) in ids.into_iter().enumerate() {
            let text = documents.get(i).cloned().flatten().unwrap_or_default();
            let metadata = metadatas.get(i).cloned().flatten();
            let distance = distances.get(i).copied().unwrap_or(f32::MAX);
            results.push(SearchResult {
                id,
                chunk: chunk_from_parts(text, metadata.as_ref()),
                score: score_from_distance(target.config.metric, distance),
            });
        }
        Ok(results)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Chunk>> {
        let target = self.resolve(collection).await?;

        let body = json!({
            "ids": [id],
            "include": ["documents", "metadatas"],
        });
        let response = self.post_to_collection(&target.id, "get", &body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(store_error(format!("get failed ({status}): {text}")));
        }

        let parsed: GetResponse = response.json().await.map_err(|e| {
            store_error(format!("failed to parse get response: {e}"))
        })?;

        if parsed.ids.is_empty() {
            return Ok(None);
        }
        let text = parsed
            .documents
            .and_then(|d| d.into_iter().next())
            .flatten()
            .unwrap_or_default();
        let metadata = parsed.metadatas.and_then(|m| m.into_iter().next()).flatten();
        Ok(Some(chunk_from_parts(text, metadata.as_ref())))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let target = self.resolve(collection).await?;

        let response = self
            .http
            .get(format!("{}/api/v1/collections/{}/count", self.base_url, target.id))
            .send()
            .await
            .map_err(|e| store_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(store_error(format!("count failed: {}", response.status())));
        }

        let count: u64 = response.json().await.map_err(|e| {
            store_error(format!("failed to parse count response: {e}"))
        })?;
        Ok(count as usize)
    }

    async fn describe(&self, collection: &str) -> Result<CollectionConfig> {
        Ok(self.resolve(collection).await?.config)
    }
}
