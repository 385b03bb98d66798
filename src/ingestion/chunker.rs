//! Character-window text chunking with fixed overlap

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Text chunker with configurable window size and overlap.
///
/// Splitting is by character count: windows of `max_chunk_size` chars,
/// each subsequent window starting `max_chunk_size - overlap_size` chars
/// after the previous one, so the trailing `overlap_size` characters
/// repeat. The final window may be shorter. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap_size` must be strictly less than
    /// `max_chunk_size`.
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap_size >= max_chunk_size {
            return Err(Error::InvalidArgument(format!(
                "overlap_size ({}) must be strictly less than max_chunk_size ({})",
                overlap_size, max_chunk_size
            )));
        }
        Ok(Self {
            max_chunk_size,
            overlap_size,
        })
    }

    /// Split one document into ordered, overlapping chunks
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = doc.content.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let stride = self.max_chunk_size - self.overlap_size;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut chunk_index = 0u32;

        loop {
            let end = (start + self.max_chunk_size).min(chars.len());
            chunks.push(Chunk {
                text: chars[start..end].iter().collect(),
                source_id: doc.source_id.clone(),
                chunk_index,
                char_start: start,
                char_end: end,
            });
            chunk_index += 1;

            if end == chars.len() {
                break;
            }
            start += stride;
        }

        chunks
    }

    /// Split a sequence of documents, grouped by document in input order
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = docs.iter().flat_map(|d| self.chunk_document(d)).collect();
        tracing::debug!("Chunked {} documents into {} chunks", docs.len(), chunks.len());
        chunks
    }
}
