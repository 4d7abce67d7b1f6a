//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for provider-agnostic, read-only nearest-neighbor lookup
//! over a prebuilt index. Implementations are synchronous; async callers run
//! them on the blocking pool.

use crate::types::{IndexStats, KnowledgeChunk};
use pulse_core::AppResult;

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending similarity score.
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>>;

    /// Get statistics about the index.
    fn stats(&self) -> AppResult<IndexStats>;
}
