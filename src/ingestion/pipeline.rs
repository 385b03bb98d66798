//! Ingestion pipeline: load, chunk, embed, and upsert in bounded batches

use futures_util::{stream, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndex};
use crate::types::{Chunk, IndexRecord};

use super::chunker::TextChunker;
use super::loader::DocumentLoader;

/// Orchestrates bulk indexing of a corpus directory.
///
/// Re-running over the same corpus creates duplicate index records; no
/// deduplication across ingestion runs is attempted.
pub struct IngestionPipeline {
    loader: DocumentLoader,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    config: IngestionConfig,
}

impl IngestionPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            loader: DocumentLoader::new(),
            chunker,
            embedder,
            index,
            config,
        }
    }

    /// Ingest every registered file under `dir`. Returns the number of
    /// chunks indexed.
    ///
    /// Chunks are embedded and upserted in batches of
    /// `config.batch_size`, with up to `config.parallelism` batches in
    /// flight at once. A batch failure fails the whole ingestion with
    /// the failing batch's chunk offset, so a caller can resume from
    /// that point.
    pub async fn ingest(&self, dir: &Path) -> Result<usize> {
        let documents = self.loader.load_dir(dir)?;
        let chunks = self.chunker.chunk_documents(&documents);
        let total = chunks.len();

        if total == 0 {
            tracing::warn!("No chunks produced from {}", dir.display());
            return Ok(0);
        }

        tracing::info!(
            "Ingesting {} chunks from {} documents in batches of {}",
            total,
            documents.len(),
            self.config.batch_size
        );

        let batches: Vec<(usize, Vec<Chunk>)> = chunks
            .chunks(self.config.batch_size)
            .enumerate()
            .map(|(i, batch)| (i * self.config.batch_size, batch.to_vec()))
            .collect();

        stream::iter(batches)
            .map(|(offset, batch)| {
                let embedder = Arc::clone(&self.embedder);
                let index = Arc::clone(&self.index);
                async move { index_batch(embedder, index, offset, batch).await }
            })
            .buffer_unordered(self.config.parallelism.max(1))
            .try_fold(0usize, |indexed, n| async move { Ok(indexed + n) })
            .await?;

        tracing::info!("Ingestion complete: {} chunks indexed", total);
        Ok(total)
    }
}

/// Embed and upsert one batch; errors carry the batch's chunk offset
async fn index_batch(
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    offset: usize,
    batch: Vec<Chunk>,
) -> Result<usize> {
    let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

    let vectors = embedder
        .embed_batch(&texts)
        .await
        .map_err(|e| Error::ingestion(offset, e.to_string()))?;

    if vectors.len() != batch.len() {
        return Err(Error::ingestion(
            offset,
            format!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            ),
        ));
    }

    let records: Vec<IndexRecord> = batch
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexRecord::from_chunk(chunk, vector))
        .collect();

    index
        .upsert(records)
        .await
        .map_err(|e| Error::ingestion(offset, e.to_string()))?;

    tracing::debug!("Indexed batch at offset {} ({} chunks)", offset, batch.len());
    Ok(batch.len())
}
