//! OpenSearch-backed vector index over its REST API
//!
//! Records live in a named index with a k-NN vector field, a text field,
//! and a source-identifier field. Upserts go through the bulk endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::VectorIndexConfig;
use crate::error::{Error, Result};
use crate::types::{IndexRecord, ScoredRecord};

use super::vector_index::VectorIndex;

/// Vector index client for an OpenSearch collection.
///
/// Schema fields: `rag_vector` (k-NN vector), `text`, `source_id`.
pub struct OpenSearchIndex {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_score")]
    score: f32,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Deserialize)]
struct HitSource {
    text: String,
    source_id: String,
}

#[derive(Deserialize)]
struct CountResponse {
    count: usize,
}

impl OpenSearchIndex {
    /// Create a new index client bounded by the configured timeout
    pub fn new(config: &VectorIndexConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.collection, suffix)
    }
}

#[async_trait]
impl VectorIndex for OpenSearchIndex {
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Bulk body: action line + document line per record, NDJSON
        let mut body = String::new();
        for record in &records {
            let action = json!({ "index": { "_id": record.id.to_string() } });
            let doc = json!({
                "rag_vector": record.vector,
                "text": record.text,
                "source_id": record.source_id,
            });
            body.push_str(&action.to_string());
            body.push('\n');
            body.push_str(&doc.to_string());
            body.push('\n');
        }

        let response = self
            .client
            .post(self.url("_bulk"))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("bulk upsert failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(format!(
                "bulk upsert failed: HTTP {}",
                response.status()
            )));
        }

        let bulk: BulkResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed bulk response: {}", e)))?;

        if bulk.errors {
            return Err(Error::retrieval(
                "bulk upsert reported item-level errors".to_string(),
            ));
        }

        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let query = json!({
            "size": k,
            "query": {
                "knn": {
                    "rag_vector": {
                        "vector": vector,
                        "k": k,
                    }
                }
            }
        });

        let response = self
            .client
            .post(self.url("_search"))
            .json(&query)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("search failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(format!(
                "search failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed search response: {}", e)))?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| ScoredRecord {
                text: hit.source.text,
                source_id: hit.source.source_id,
                score: hit.score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        let response = self
            .client
            .get(self.url("_count"))
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("count failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(format!(
                "count failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed count response: {}", e)))?;

        Ok(parsed.count)
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(&self.base_url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "opensearch"
    }
}
