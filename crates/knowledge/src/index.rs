//! SQLite-backed vector index for knowledge chunks.
//!
//! The index is built elsewhere and opened read-only. Opening is lazy so a
//! missing file only surfaces when a search is attempted, and an index that
//! appears later is picked up on the next query.

use crate::types::{IndexStats, KnowledgeChunk};
use crate::vector_index::VectorIndex;
use pulse_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
"#;

/// Vector index stored in a single SQLite file.
pub struct SqliteIndex {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteIndex {
    /// Refer to an existing index. Nothing is touched until the first query.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(None),
        }
    }

    /// Create (or reopen) a writable index with the chunk schema.
    pub fn create(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Initialized SQLite index at {:?}", path);

        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a chunk with embedding into the index.
    pub fn insert_chunk(&self, chunk: &KnowledgeChunk) -> AppResult<()> {
        let embedding = chunk
            .embedding
            .as_ref()
            .ok_or_else(|| AppError::Knowledge("Chunk missing embedding".to_string()))?;
        let embedding_bytes = embedding_to_bytes(embedding);

        let metadata_json = serde_json::to_string(&chunk.metadata)?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO chunks (id, source_id, position, text, embedding, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    chunk.id,
                    chunk.source_id,
                    chunk.position as i64,
                    chunk.text,
                    embedding_bytes,
                    metadata_json,
                ],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
            Ok(())
        })
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| AppError::Knowledge("SQLite index lock poisoned".to_string()))?;

        if guard.is_none() {
            *guard = Some(open_read_only(&self.path)?);
        }

        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(AppError::RetrievalUnavailable(format!(
                "index at {:?} is not open",
                self.path
            ))),
        }
    }
}

fn open_read_only(path: &Path) -> AppResult<Connection> {
    if !path.is_file() {
        return Err(AppError::RetrievalUnavailable(format!(
            "index not found at {:?}",
            path
        )));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY,
    )
    .map_err(|e| AppError::RetrievalUnavailable(format!("cannot open index {:?}: {}", path, e)))?;

    tracing::debug!("Opened SQLite index read-only at {:?}", path);
    Ok(conn)
}

impl VectorIndex for SqliteIndex {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut results = self.with_connection(|conn| query_chunks(conn, query_embedding))?;

        // Stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{})",
            results.len(),
            top_k
        );

        Ok(results)
    }

    fn stats(&self) -> AppResult<IndexStats> {
        let (sources_count, chunks_count, dimensions) = self.with_connection(|conn| {
            let (sources, chunks): (i64, i64) = conn
                .query_row(
                    "SELECT COUNT(DISTINCT source_id), COUNT(*) FROM chunks",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to count chunks: {}", e)))?;

            let width: Option<i64> = conn
                .query_row(
                    "SELECT length(embedding) FROM chunks ORDER BY rowid LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })
                .map_err(|e| AppError::Knowledge(format!("Failed to read index width: {}", e)))?;

            Ok((
                sources as u32,
                chunks as u32,
                width.map(|bytes| bytes as usize / 4),
            ))
        })?;

        let db_size_bytes = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(IndexStats {
            path: self.path.clone(),
            sources_count,
            chunks_count,
            dimensions,
            db_size_bytes,
        })
    }
}

/// Score every stored chunk against the query embedding.
fn query_chunks(conn: &Connection, query_embedding: &[f32]) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
    let mut stmt = conn
        .prepare("SELECT id, source_id, position, text, embedding, metadata FROM chunks ORDER BY rowid")
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let metadata_json: Option<String> = row.get(5)?;

            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                embedding_bytes,
                metadata_json,
            ))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

    let mut results = Vec::new();
    for row in rows {
        let (id, source_id, position, text, embedding_bytes, metadata_json) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;

        let embedding = bytes_to_embedding(&embedding_bytes)?;
        if embedding.len() != query_embedding.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding dimension mismatch: index has {}, query has {}",
                embedding.len(),
                query_embedding.len()
            )));
        }

        let metadata = match metadata_json {
            Some(json) => serde_json::from_str(&json)?,
            None => serde_json::Value::Null,
        };

        let score = cosine_similarity(query_embedding, &embedding);
        results.push((
            KnowledgeChunk {
                id,
                source_id,
                position: position as u32,
                text,
                embedding: Some(embedding),
                metadata,
            },
            score,
        ));
    }

    Ok(results)
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_index(dir: &TempDir) -> SqliteIndex {
        let index = SqliteIndex::create(dir.path().join("storage/index.sqlite")).unwrap();
        index
            .insert_chunk(&KnowledgeChunk::new("c1", "doc-a", 0, "east", vec![1.0, 0.0, 0.0]))
            .unwrap();
        index
            .insert_chunk(&KnowledgeChunk::new("c2", "doc-a", 1, "north-east", vec![0.7, 0.7, 0.0]))
            .unwrap();
        index
            .insert_chunk(&KnowledgeChunk::new("c3", "doc-b", 0, "north", vec![0.0, 1.0, 0.0]))
            .unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_score() {
        let temp = TempDir::new().unwrap();
        let index = seeded_index(&temp);

        let results = index.search(&[1.0, 0.0, 0.0], 5).unwrap();
        let ids: Vec<&str> = results.iter().map(|(c, _)| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert!((results[0].1 - 1.0).abs() < 0.001);
        assert!(results[0].1 >= results[1].1 && results[1].1 >= results[2].1);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let temp = TempDir::new().unwrap();
        let index = seeded_index(&temp);

        assert_eq!(index.search(&[0.0, 1.0, 0.0], 2).unwrap().len(), 2);
        assert!(index.search(&[0.0, 1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_read_only() {
        let temp = TempDir::new().unwrap();
        let path = seeded_index(&temp).path().to_path_buf();

        let index = SqliteIndex::open(&path);
        let results = index.search(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].0.text, "north");

        // Read-only handle refuses writes
        let err = index
            .insert_chunk(&KnowledgeChunk::new("c4", "doc-c", 0, "x", vec![0.0, 0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, AppError::Knowledge(_)));
    }

    #[test]
    fn test_missing_index_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(temp.path().join("nope.sqlite"));

        let err = index.search(&[1.0], 4).unwrap_err();
        assert!(matches!(err, AppError::RetrievalUnavailable(_)));
        // The missing file is not created as a side effect
        assert!(!temp.path().join("nope.sqlite").exists());
    }

    #[test]
    fn test_dimension_mismatch() {
        let temp = TempDir::new().unwrap();
        let index = seeded_index(&temp);

        let err = index.search(&[1.0, 0.0], 4).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn test_stats() {
        let temp = TempDir::new().unwrap();
        let index = seeded_index(&temp);

        let stats = index.stats().unwrap();
        assert_eq!(stats.sources_count, 2);
        assert_eq!(stats.chunks_count, 3);
        assert_eq!(stats.dimensions, Some(3));
        assert!(stats.db_size_bytes > 0);
    }

    #[test]
    fn test_stats_empty_index() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::create(temp.path().join("empty.sqlite")).unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.chunks_count, 0);
        assert_eq!(stats.dimensions, None);
    }

    #[test]
    fn test_embedding_bytes_are_little_endian() {
        let bytes = embedding_to_bytes(&[1.0]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
        assert!(bytes_to_embedding(&[0, 0, 128]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
