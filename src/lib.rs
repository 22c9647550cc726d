//! # docqa
//!
//! Retrieval-augmented question answering over document files.
//!
//! ## Overview
//!
//! This crate turns a document file into an answerable knowledge base in
//! two phases:
//!
//! - **Ingestion**: load a PDF or text file into pages, split the text
//!   into overlapping character chunks, embed each chunk over a hosted
//!   model API, and store the vectors in a named collection.
//! - **Answering**: embed a question, retrieve the most similar chunks,
//!   and ask a generation model to answer from exactly that context.
//!
//! The seams are traits: [`EmbeddingProvider`] and [`TextGenerator`] for
//! hosted models (IBM watsonx.ai by default, OpenAI behind the `openai`
//! feature) and [`VectorStore`] for storage ([`InMemoryVectorStore`]
//! bundled, Chroma behind the `chroma` feature).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use docqa::watsonx::{WatsonxClient, WatsonxEmbeddingProvider, WatsonxGenerator};
//! use docqa::{InMemoryVectorStore, RagPipeline};
//!
//! # async fn run() -> docqa::Result<()> {
//! let client = Arc::new(WatsonxClient::from_env()?);
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(Arc::new(WatsonxEmbeddingProvider::new(Arc::clone(&client))))
//!     .generator(Arc::new(WatsonxGenerator::new(client)))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.create_collection("docs").await?;
//! pipeline.ingest_file("docs", Path::new("paper.pdf")).await?;
//! let answer = pipeline.answer("docs", "What is the attention mechanism?").await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `watsonx` | yes | [`watsonx`] embedding and generation providers |
//! | `openai` | no | [`openai`] embedding and chat providers |
//! | `chroma` | no | [`chroma`] vector store backend |
//! | `full` | no | everything above |

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod retry;
pub mod vectorstore;

#[cfg(feature = "chroma")]
pub mod chroma;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "watsonx")]
pub mod watsonx;

pub use chunking::TextChunker;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Answer, Chunk, Document, Page, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{Generation, GenerationParams, TextGenerator};
pub use inmemory::InMemoryVectorStore;
pub use loader::load_document;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use retry::RetryPolicy;
pub use vectorstore::{CollectionConfig, Metric, VectorStore};

#[cfg(feature = "chroma")]
pub use chroma::ChromaVectorStore;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatGenerator, OpenAIEmbeddingProvider};
#[cfg(feature = "watsonx")]
pub use watsonx::{WatsonxClient, WatsonxConfig, WatsonxEmbeddingProvider, WatsonxGenerator};
