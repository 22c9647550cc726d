//! Tests for in-memory vector store ordering, isolation, and config checks.

use docqa::document::Chunk;
use docqa::error::RagError;
use docqa::inmemory::InMemoryVectorStore;
use docqa::vectorstore::{CollectionConfig, Metric, VectorStore};
use proptest::prelude::*;

fn chunk(text: &str) -> Chunk {
    Chunk { text: text.to_string(), page: 0, offset: 0 }
}

fn collection_config(dimensions: usize, metric: Metric) -> CollectionConfig {
    CollectionConfig { dimensions, metric, embedding_model: "mock-hash".to_string() }
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk text together with a normalized embedding.
fn arb_entry(dim: usize) -> impl Strategy<Value = (Chunk, Vec<f32>)> {
    ("[a-z ]{5,30}", arb_normalized_embedding(dim))
        .prop_map(|(text, embedding)| (chunk(&text), embedding))
}

/// For any set of stored entries and any query vector, results come back
/// ordered by descending score and never exceed `top_k` or the number of
/// stored entries.
mod prop_query_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            entries in proptest::collection::vec(arb_entry(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let entry_count = entries.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store
                    .create_collection("test", collection_config(DIM, Metric::Cosine))
                    .await
                    .unwrap();
                store.add("test", entries).await.unwrap();
                store.query("test", &query, top_k).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= entry_count);

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn querying_twice_returns_identical_results(
            entries in proptest::collection::vec(arb_entry(DIM), 1..10),
            query in arb_normalized_embedding(DIM),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (first, second) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store
                    .create_collection("test", collection_config(DIM, Metric::Cosine))
                    .await
                    .unwrap();
                store.add("test", entries).await.unwrap();
                let first = store.query("test", &query, 5).await.unwrap();
                let second = store.query("test", &query, 5).await.unwrap();
                (first, second)
            });

            let first_ids: Vec<&str> = first.iter().map(|r| r.id.as_str()).collect();
            let second_ids: Vec<&str> = second.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(first_ids, second_ids);
        }
    }
}

#[tokio::test]
async fn creating_an_existing_collection_fails() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(4, Metric::Cosine)).await.unwrap();
    let result = store.create_collection("docs", collection_config(8, Metric::Cosine)).await;
    assert!(matches!(result, Err(RagError::StoreError { .. })));

    // The original config survives the failed second create.
    assert_eq!(store.describe("docs").await.unwrap().dimensions, 4);
}

#[tokio::test]
async fn add_rejects_mismatched_dimensions_and_inserts_nothing() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(768, Metric::Cosine)).await.unwrap();

    // A 384-dim vector in a 768-dim collection fails the whole batch.
    let entries = vec![(chunk("fits"), vec![0.5; 768]), (chunk("wrong model"), vec![0.5; 384])];
    let result = store.add("docs", entries).await;
    assert!(matches!(result, Err(RagError::StoreError { .. })));
    assert_eq!(store.count("docs").await.unwrap(), 0);
}

#[tokio::test]
async fn query_rejects_mismatched_dimensions() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(4, Metric::Cosine)).await.unwrap();
    let result = store.query("docs", &[1.0, 0.0], 3).await;
    assert!(matches!(result, Err(RagError::StoreError { .. })));
}

#[tokio::test]
async fn querying_an_empty_collection_returns_no_results() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(4, Metric::Cosine)).await.unwrap();
    let results = store.query("docs", &[1.0, 0.0, 0.0, 0.0], 3).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn operations_on_unknown_collections_fail() {
    let store = InMemoryVectorStore::new();
    assert!(store.add("nope", vec![(chunk("x"), vec![1.0])]).await.is_err());
    assert!(store.query("nope", &[1.0], 1).await.is_err());
    assert!(store.get("nope", "id").await.is_err());
    assert!(store.count("nope").await.is_err());
    assert!(store.describe("nope").await.is_err());
    // Deleting an absent collection is a no-op.
    assert!(store.delete_collection("nope").await.is_ok());
}

#[tokio::test]
async fn equal_scores_break_ties_by_insertion_order() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(2, Metric::Cosine)).await.unwrap();

    // Identical vectors score identically against any query.
    let ids = store
        .add(
            "docs",
            vec![
                (chunk("first in"), vec![1.0, 0.0]),
                (chunk("second in"), vec![1.0, 0.0]),
                (chunk("third in"), vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();

    let results = store.query("docs", &[1.0, 0.0], 3).await.unwrap();
    let result_ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(result_ids, ids.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn get_returns_stored_chunks_by_id() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(2, Metric::Cosine)).await.unwrap();

    let stored = Chunk { text: "hello".to_string(), page: 3, offset: 120 };
    let ids = store.add("docs", vec![(stored.clone(), vec![0.0, 1.0])]).await.unwrap();
    assert_eq!(ids.len(), 1);

    let fetched = store.get("docs", &ids[0]).await.unwrap();
    assert_eq!(fetched, Some(stored));
    assert_eq!(store.get("docs", "no-such-id").await.unwrap(), None);
}

#[tokio::test]
async fn count_tracks_additions() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(2, Metric::Cosine)).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 0);

    store.add("docs", vec![(chunk("a"), vec![1.0, 0.0])]).await.unwrap();
    store
        .add("docs", vec![(chunk("b"), vec![0.0, 1.0]), (chunk("c"), vec![1.0, 1.0])])
        .await
        .unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 3);
}

#[tokio::test]
async fn describe_returns_the_frozen_config() {
    let store = InMemoryVectorStore::new();
    let config = CollectionConfig {
        dimensions: 768,
        metric: Metric::DotProduct,
        embedding_model: "ibm/slate-125m-english-rtrvr-v2".to_string(),
    };
    store.create_collection("docs", config.clone()).await.unwrap();
    assert_eq!(store.describe("docs").await.unwrap(), config);
}

#[tokio::test]
async fn euclidean_metric_ranks_nearer_vectors_first() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(2, Metric::Euclidean)).await.unwrap();

    // Both vectors point the same way; cosine would tie, distance does not.
    store
        .add("docs", vec![(chunk("far"), vec![5.0, 0.0]), (chunk("near"), vec![1.0, 0.0])])
        .await
        .unwrap();

    let results = store.query("docs", &[1.0, 0.0], 2).await.unwrap();
    assert_eq!(results[0].chunk.text, "near");
    assert_eq!(results[1].chunk.text, "far");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn dot_product_metric_rewards_magnitude() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(2, Metric::DotProduct)).await.unwrap();

    store
        .add("docs", vec![(chunk("small"), vec![1.0, 0.0]), (chunk("large"), vec![3.0, 0.0])])
        .await
        .unwrap();

    let results = store.query("docs", &[1.0, 0.0], 2).await.unwrap();
    assert_eq!(results[0].chunk.text, "large");
}

#[tokio::test]
async fn delete_collection_discards_entries() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", collection_config(2, Metric::Cosine)).await.unwrap();
    store.add("docs", vec![(chunk("gone"), vec![1.0, 0.0])]).await.unwrap();

    store.delete_collection("docs").await.unwrap();
    assert!(store.count("docs").await.is_err());

    // The name is free for a fresh collection afterwards.
    store.create_collection("docs", collection_config(2, Metric::Cosine)).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 0);
}
