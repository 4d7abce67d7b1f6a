//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A text chunk with embedding, as stored in the prebuilt index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Source document ID
    pub source_id: String,

    /// Position within source
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Metadata (e.g., file name, page)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl KnowledgeChunk {
    /// Build a chunk ready to be written to an index.
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        position: u32,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            position,
            text: text.into(),
            embedding: Some(embedding),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Statistics for a vector index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Location of the index
    pub path: PathBuf,

    /// Number of distinct source documents
    pub sources_count: u32,

    /// Number of chunks
    pub chunks_count: u32,

    /// Embedding width of the stored vectors, if any are stored
    pub dimensions: Option<usize>,

    /// Database size in bytes
    pub db_size_bytes: u64,
}
