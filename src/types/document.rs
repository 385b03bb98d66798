//! Document, chunk, and index record types with source tracking

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A document loaded from the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Path the document was loaded from
    pub path: PathBuf,
    /// Stable source identifier (normalized corpus-relative path)
    pub source_id: String,
    /// Full UTF-8 text content
    pub content: String,
}

impl Document {
    /// Create a new document
    pub fn new(path: PathBuf, source_id: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            source_id,
            content,
        }
    }
}

/// A bounded, overlapping slice of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content, at most `max_chunk_size` characters
    pub text: String,
    /// Source identifier of the parent document
    pub source_id: String,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Character offset of the chunk start in the document
    pub char_start: usize,
    /// Character offset one past the chunk end
    pub char_end: usize,
}

/// Persisted unit in the vector index; one-to-one with a chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Record ID
    pub id: Uuid,
    /// Embedding vector; dimension fixed across the index
    pub vector: Vec<f32>,
    /// Chunk text
    pub text: String,
    /// Source identifier of the originating document
    pub source_id: String,
}

impl IndexRecord {
    /// Build an index record from a chunk and its embedding
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vector,
            text: chunk.text.clone(),
            source_id: chunk.source_id.clone(),
        }
    }
}

/// A record returned from a similarity search, closest first
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// Chunk text
    pub text: String,
    /// Source identifier
    pub source_id: String,
    /// Similarity score (higher is more similar)
    pub score: f32,
}
