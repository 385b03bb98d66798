//! Vector index trait for storing and searching chunk records

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IndexRecord, ScoredRecord};

/// Trait for vector storage and nearest-neighbor search.
///
/// Records are immutable once upserted; the index owns them afterwards.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert a batch of records
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<()>;

    /// Search for the `k` nearest records, closest first. Tie order is
    /// the index's own, stable within one call.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>>;

    /// Total number of records stored
    async fn len(&self) -> Result<usize>;

    /// Check if the index is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Index name for logging
    fn name(&self) -> &str;
}
