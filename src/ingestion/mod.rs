//! Document ingestion: loading, chunking, and indexing

pub mod chunker;
pub mod loader;
pub mod pipeline;

pub use chunker::TextChunker;
pub use loader::DocumentLoader;
pub use pipeline::IngestionPipeline;
