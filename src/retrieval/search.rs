//! Similarity retrieval against the vector index

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndex};

/// A retrieved chunk, closest first
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Chunk text
    pub text: String,
    /// Source identifier of the originating document
    pub source_id: String,
    /// Similarity score from the index
    pub score: f32,
}

/// Retrieves the most relevant chunks for a query string
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Retrieve up to `k` chunks ranked by the index's own similarity
    /// ordering. `k` must be positive.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::InvalidArgument(
                "retrieval k must be greater than zero".to_string(),
            ));
        }

        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Error::retrieval(format!("query embedding failed: {}", e)))?;

        let mut hits = self
            .index
            .search(&vector, k)
            .await
            .map_err(|e| Error::retrieval(format!("index search failed: {}", e)))?;
        hits.truncate(k);

        tracing::debug!("Retrieved {} chunks for query \"{}\"", hits.len(), query);

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                text: hit.text,
                source_id: hit.source_id,
                score: hit.score,
            })
            .collect())
    }
}
