//! doc-chat: conversational RAG over a private document corpus
//!
//! Combines vector-based semantic retrieval with a generative language
//! model, preserving multi-turn conversational context and citing source
//! documents. Ingestion converts Markdown corpora into indexed,
//! overlapping chunks; the query path condenses each question, retrieves
//! grounding chunks, streams a generated answer, and attaches ranked
//! source citations while updating the session history.

pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod types;

pub use chat::{AnswerStream, ChatPipeline};
pub use config::ChatConfig;
pub use error::{Error, Result};
pub use ingestion::IngestionPipeline;
pub use retrieval::LinkMap;
pub use session::Session;
pub use types::{Chunk, Document, IndexRecord, Message, Role};
