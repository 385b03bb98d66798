//! In-process vector index with brute-force cosine search
//!
//! Used by the test suite and small corpora that do not warrant an
//! external index service.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::{IndexRecord, ScoredRecord};

use super::vector_index::VectorIndex;

/// In-memory vector index
#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<Vec<IndexRecord>>,
}

impl InMemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<()> {
        let mut store = self.records.write();
        let mut dims = store.first().map(|r| r.vector.len());
        for record in &records {
            if record.vector.is_empty() {
                return Err(Error::retrieval("record has an empty vector"));
            }
            match dims {
                Some(d) if record.vector.len() != d => {
                    return Err(Error::retrieval(format!(
                        "vector dimension mismatch: index holds {}, record has {}",
                        d,
                        record.vector.len()
                    )));
                }
                None => dims = Some(record.vector.len()),
                _ => {}
            }
        }
        store.extend(records);
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let store = self.records.read();

        let mut scored: Vec<ScoredRecord> = store
            .iter()
            .map(|record| ScoredRecord {
                text: record.text.clone(),
                source_id: record.source_id.clone(),
                score: cosine_similarity(vector, &record.vector),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
