//! Ranking behavior of the SQLite index as seen through the retriever.

use crate::index::SqliteIndex;
use crate::retriever::ContextRetriever;
use crate::types::KnowledgeChunk;
use crate::vector_index::VectorIndex;
use crate::embeddings::providers::TrigramProvider;
use pulse_core::SnippetOrigin;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn index_with(dir: &TempDir, chunks: &[(&str, Vec<f32>)]) -> SqliteIndex {
    let index = SqliteIndex::create(dir.path().join("ranking.sqlite")).unwrap();
    for (i, (text, embedding)) in chunks.iter().enumerate() {
        index
            .insert_chunk(&KnowledgeChunk::new(
                format!("chunk{}", i + 1),
                "source1",
                i as u32,
                *text,
                embedding.clone(),
            ))
            .unwrap();
    }
    index
}

#[test]
fn test_relevant_chunk_scores_high() {
    let temp = TempDir::new().unwrap();
    let index = index_with(
        &temp,
        &[
            ("Index funds track a market benchmark", normalize(&[1.0, 0.5, 0.2, 0.1])),
            ("Cooking recipes for pasta", normalize(&[-0.3, -0.8, 0.4, -0.2])),
        ],
    );

    let results = index.search(&normalize(&[0.9, 0.4, 0.3, 0.1]), 5).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.id, "chunk1", "Most relevant chunk should be first");
    assert!(results[0].1 > 0.8, "Relevant chunk score should be high: {}", results[0].1);
    assert!(results[0].1 > results[1].1, "Scores should be ordered");
}

#[test]
fn test_negative_similarity_is_still_returned() {
    let temp = TempDir::new().unwrap();
    let index = index_with(&temp, &[("opposite", normalize(&[-1.0, 0.0, 0.0]))]);

    // No relevance cutoff: the k nearest are returned whatever their score
    let results = index.search(&[1.0, 0.0, 0.0], 4).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].1 < 0.0);
}

#[test]
fn test_empty_index_returns_no_results() {
    let temp = TempDir::new().unwrap();
    let index = index_with(&temp, &[]);
    assert!(index.search(&[1.0, 0.0], 4).unwrap().is_empty());
}

#[test]
fn test_equal_scores_keep_insertion_order() {
    let temp = TempDir::new().unwrap();
    let same = normalize(&[0.5, 0.5]);
    let index = index_with(
        &temp,
        &[("first", same.clone()), ("second", same.clone()), ("third", same)],
    );

    let ids: Vec<String> = index
        .search(&[1.0, 1.0], 3)
        .unwrap()
        .into_iter()
        .map(|(c, _)| c.id)
        .collect();
    assert_eq!(ids, vec!["chunk1", "chunk2", "chunk3"]);
}

#[tokio::test]
async fn test_duplicates_are_not_collapsed() {
    let temp = TempDir::new().unwrap();
    let embedder = Arc::new(TrigramProvider::new(128));
    let text = "The Federal Reserve sets interest rates.";
    let embedding = crate::embeddings::EmbeddingProvider::embed(embedder.as_ref(), text)
        .await
        .unwrap();
    let index = index_with(&temp, &[(text, embedding.clone()), (text, embedding)]);

    let retriever = ContextRetriever::new(embedder, Arc::new(index));
    let context = retriever.retrieve("Who sets interest rates?", 4).await;

    assert_eq!(context.len(), 2);
    assert_eq!(context.snippets()[0].source_text, context.snippets()[1].source_text);
    for snippet in context.snippets() {
        match snippet.origin {
            SnippetOrigin::Knowledge { score } => assert!(score > 0.0),
            ref other => panic!("unexpected origin {:?}", other),
        }
    }
}
