//! Static knowledge base access.
//!
//! Read-only retrieval over a prebuilt SQLite vector index: embedding
//! providers, the [`VectorIndex`] abstraction and the [`ContextRetriever`]
//! that turns a question into ranked context snippets.

pub mod embeddings;
pub mod index;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::SqliteIndex;
pub use retriever::{ContextRetriever, DEFAULT_TOP_K};
pub use types::{IndexStats, KnowledgeChunk};
pub use vector_index::VectorIndex;
