//! Core types shared across the pipeline

pub mod document;
pub mod message;

pub use document::{Chunk, Document, IndexRecord, ScoredRecord};
pub use message::{Message, Role};
