//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main chat system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Vector index configuration
    #[serde(default)]
    pub index: VectorIndexConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Ingestion configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Source link configuration
    #[serde(default)]
    pub links: LinkConfig,
    /// Example questions shown to the user at chat start
    #[serde(default)]
    pub example_questions: Vec<String>,
}

impl ChatConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration; failures here are fatal at startup
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "chunking.max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.overlap_size >= self.chunking.max_chunk_size {
            return Err(Error::InvalidArgument(format!(
                "chunking.overlap_size ({}) must be strictly less than max_chunk_size ({})",
                self.chunking.overlap_size, self.chunking.max_chunk_size
            )));
        }
        if self.llm.base_url.is_empty() {
            return Err(Error::config("llm.base_url is required"));
        }
        if self.index.base_url.is_empty() {
            return Err(Error::config("index.base_url is required"));
        }
        if self.index.collection.is_empty() {
            return Err(Error::config("index.collection is required"));
        }
        if self.ingestion.batch_size == 0 {
            return Err(Error::InvalidArgument(
                "ingestion.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidArgument(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap_size: 20,
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (fixed per provider instance)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed non-streaming requests
    pub max_retries: u32,
    /// Sampling parameters passed with every generation call
    #[serde(default)]
    pub params: GenerationParams,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            timeout_secs: 120,
            max_retries: 2,
            params: GenerationParams::default(),
        }
    }
}

/// Sampling parameters for the generation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum output length in tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling threshold
    pub top_p: f32,
    /// Top-k sampling
    pub top_k: u32,
    /// Stop sequences
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.0,
            top_p: 1.0,
            top_k: 250,
            stop: vec!["\n\nUser:".to_string()],
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Index endpoint base URL
    pub base_url: String,
    /// Named collection holding the chunk records
    pub collection: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            collection: "doc-chat-chunks".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Number of chunks embedded and upserted per batch
    pub batch_size: usize,
    /// Number of batches processed concurrently
    pub parallelism: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            parallelism: 4,
        }
    }
}

/// Source link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Path to the two-column filename,url mapping file
    pub path: Option<PathBuf>,
    /// Corpus prefix stripped from source identifiers before lookup
    pub strip_prefix: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            path: None,
            strip_prefix: "./data/".to_string(),
        }
    }
}
