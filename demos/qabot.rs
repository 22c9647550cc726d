//! # Document Q&A
//!
//! One-shot question answering over a single document with watsonx.ai:
//! ingest the file, ask one question, print the answer with its sources.
//!
//! Run: `cargo run --example qabot -- paper.pdf "What is the main finding?"`
//!
//! Credentials come from the `IBM_URL_END_POINT`, `IBM_API_KEY`, and
//! `IBM_PROJECT_ID` environment variables (a `.env` file is honored).

use std::path::Path;
use std::sync::Arc;

use docqa::watsonx::{WatsonxClient, WatsonxEmbeddingProvider, WatsonxGenerator};
use docqa::{InMemoryVectorStore, RagPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(file), Some(question)) = (args.next(), args.next()) else {
        eprintln!("usage: qabot <file.pdf|file.txt> <question>");
        std::process::exit(2);
    };

    let client = Arc::new(WatsonxClient::from_env()?);
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(WatsonxEmbeddingProvider::new(Arc::clone(&client))))
        .generator(Arc::new(WatsonxGenerator::new(client)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()?;

    let collection = "document";
    pipeline.create_collection(collection).await?;

    println!("Ingesting {file}...");
    let ids = pipeline.ingest_file(collection, Path::new(&file)).await?;
    println!("  {} chunk(s) stored", ids.len());

    let answer = pipeline.answer(collection, &question).await?;

    println!("\n{}", answer.text.trim());
    if !answer.sources.is_empty() {
        println!("\nSources:");
        for (i, source) in answer.sources.iter().enumerate() {
            println!(
                "  {}. [score={:.4}] page {} | {}",
                i + 1,
                source.score,
                source.chunk.page + 1,
                preview(&source.chunk.text),
            );
        }
    }

    Ok(())
}

/// First 80 characters of a chunk, whitespace collapsed.
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out: String = flat.chars().take(80).collect();
    if flat.chars().count() > 80 {
        out.push_str("...");
    }
    out
}
