//! Error types for the RAG system

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing endpoint, bad credentials); fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Corpus directory could not be scanned
    #[error("Failed to scan directory '{path}': {message}")]
    DirectoryScan { path: String, message: String },

    /// A corpus file could not be read
    #[error("Failed to read document '{path}': {message}")]
    DocumentRead { path: String, message: String },

    /// File extension has no registered loader
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// Ingestion batch failure; `offset` is the chunk offset of the failed batch
    #[error("Ingestion failed at chunk offset {offset}: {message}")]
    Ingestion { offset: usize, message: String },

    /// Invalid caller-supplied argument (bad `k`, bad chunk-size/overlap)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Embedding or index failure during query
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Model call or mid-stream failure
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Session state machine violation (double finalize, turn in flight)
    #[error("Session state error: {0}")]
    SessionState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a directory scan error
    pub fn directory_scan(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DirectoryScan {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a document read error
    pub fn document_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an ingestion error scoped to a batch offset
    pub fn ingestion(offset: usize, message: impl Into<String>) -> Self {
        Self::Ingestion {
            offset,
            message: message.into(),
        }
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
