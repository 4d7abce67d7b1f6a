//! Context retrieval over the prebuilt knowledge index.
//!
//! Embeds the question, asks the vector index for the nearest chunks and
//! turns them into ranked [`ContextSnippet`]s. Any failure along the way is
//! logged and degrades to an empty [`Context`]; callers never see an error.

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::SqliteIndex;
use crate::types::IndexStats;
use crate::vector_index::VectorIndex;
use pulse_core::{AppConfig, AppError, AppResult, Context, ContextSnippet};
use std::sync::Arc;

/// Default number of snippets per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Static-knowledge retriever.
#[derive(Clone)]
pub struct ContextRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl ContextRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Wire the configured embedding provider to the SQLite index.
    ///
    /// The index file is not opened here, so a missing index does not stop
    /// the assistant from starting.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_provider(config)?;
        let index = SqliteIndex::open(config.resolved_index_path());

        tracing::debug!(
            "Context retriever: embedder={} ({}), index={:?}",
            embedder.provider_name(),
            embedder.model_name(),
            index.path()
        );

        Ok(Self::new(embedder, Arc::new(index)))
    }

    /// Retrieve the `k` snippets closest to `question`, most relevant first.
    pub async fn retrieve(&self, question: &str, k: usize) -> Context {
        match self.try_retrieve(question, k).await {
            Ok(context) => context,
            Err(err) => {
                let err = match err {
                    AppError::RetrievalUnavailable(_) => err,
                    other => AppError::RetrievalUnavailable(other.to_string()),
                };
                tracing::warn!("{}; continuing with empty context", err);
                Context::empty()
            }
        }
    }

    async fn try_retrieve(&self, question: &str, k: usize) -> AppResult<Context> {
        if k == 0 {
            return Ok(Context::empty());
        }

        let embedding = self.embedder.embed(question).await?;

        let index = Arc::clone(&self.index);
        let results = tokio::task::spawn_blocking(move || index.search(&embedding, k))
            .await
            .map_err(|e| AppError::RetrievalUnavailable(format!("search task failed: {}", e)))??;

        if results.is_empty() {
            tracing::info!("Knowledge index returned no chunks");
        } else {
            tracing::debug!(
                "Retrieved {} chunks (top score {:.3})",
                results.len(),
                results[0].1
            );
        }

        Ok(Context::new(
            results
                .into_iter()
                .map(|(chunk, score)| ContextSnippet::knowledge(chunk.text, score))
                .collect(),
        ))
    }

    /// Statistics of the underlying index.
    pub async fn stats(&self) -> AppResult<IndexStats> {
        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || index.stats())
            .await
            .map_err(|e| AppError::Knowledge(format!("stats task failed: {}", e)))?
    }
}
