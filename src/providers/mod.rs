//! Provider abstractions for embeddings, generation, and vector storage
//!
//! Trait-based seams so the pipeline depends on explicit,
//! constructor-injected clients rather than ambient globals.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod opensearch;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use llm::{FragmentStream, GenerationModel};
pub use memory::InMemoryIndex;
pub use ollama::OllamaClient;
pub use opensearch::OpenSearchIndex;
pub use vector_index::VectorIndex;
