//! # In-memory RAG demo
//!
//! Exercises the whole pipeline with **zero API keys**: a deterministic
//! hash-based embedder stands in for the hosted embedding model and a
//! canned generator answers by quoting the best retrieved chunk.
//!
//! Run: `cargo run --example rag_memory`

use std::sync::Arc;

use docqa::{
    Document, EmbeddingProvider, Generation, InMemoryVectorStore, RagConfig, RagPipeline,
    TextGenerator,
};

// ---------------------------------------------------------------------------
// MockEmbeddingProvider: deterministic hash-based embeddings
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> docqa::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                // Deterministic embedding: hash the text bytes, then generate
                // a normalised vector whose direction depends on the content.
                let hash = text
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
                let mut emb = vec![0.0f32; self.dimensions];
                for (i, v) in emb.iter_mut().enumerate() {
                    *v = ((hash.wrapping_add(i as u64)) as f32).sin();
                }
                // L2-normalise so cosine similarity is just the dot product.
                let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    emb.iter_mut().for_each(|x| *x /= norm);
                }
                emb
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "mock-hash"
    }
}

// ---------------------------------------------------------------------------
// ExtractiveGenerator: quotes the top retrieved passage
// ---------------------------------------------------------------------------

struct ExtractiveGenerator;

#[async_trait::async_trait]
impl TextGenerator for ExtractiveGenerator {
    async fn generate(&self, prompt: &str) -> docqa::Result<Generation> {
        let text = prompt
            .lines()
            .find(|line| line.starts_with("[1] "))
            .map(|line| line.trim_start_matches("[1] ").to_string())
            .unwrap_or_else(|| "The context does not contain the answer.".to_string());
        Ok(Generation {
            text,
            model_id: "extractive-mock".to_string(),
            generated_tokens: None,
            stop_reason: None,
        })
    }

    fn model_id(&self) -> &str {
        "extractive-mock"
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Small chunks with overlap keep the demo output readable.
    let config = RagConfig::builder().chunk_size(200).chunk_overlap(50).top_k(3).build()?;

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(64)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .generator(Arc::new(ExtractiveGenerator))
        .build()?;

    let collection = "knowledge_base";
    pipeline.create_collection(collection).await?;

    let documents = vec![
        Document::from_text(
            "rust.txt",
            "Rust is a systems programming language focused on safety, speed, and \
             concurrency. It achieves memory safety without a garbage collector through \
             its ownership system.",
        ),
        Document::from_text(
            "python.txt",
            "Python is a high-level, interpreted programming language known for its \
             readability and versatility. It is widely used in data science, web \
             development, and automation.",
        ),
        Document::from_text(
            "rag.txt",
            "Retrieval-Augmented Generation (RAG) combines a retrieval system with a \
             language model. Documents are chunked, embedded, and stored in a vector \
             database. At query time the most relevant chunks are retrieved and fed to \
             the model as context.",
        ),
    ];

    println!("Ingesting {} documents...", documents.len());
    for doc in &documents {
        let ids = pipeline.ingest(collection, doc).await?;
        println!("  {} -> {} chunk(s)", doc.source, ids.len());
    }

    let questions =
        ["How does Rust achieve memory safety?", "Which language is used in data science?"];

    for question in &questions {
        println!("\nQuestion: \"{question}\"");
        let answer = pipeline.answer(collection, question).await?;
        println!("Answer: {}", answer.text);
        for (i, source) in answer.sources.iter().enumerate() {
            println!("  {}. [score={:.4}] {}", i + 1, source.score, source.chunk.text);
        }
    }

    println!("\nDone.");
    Ok(())
}
