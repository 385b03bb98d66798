//! Query-time retrieval: similarity search, link resolution, and source ranking

pub mod links;
pub mod search;
pub mod sources;

pub use links::LinkMap;
pub use search::{RetrievedChunk, Retriever};
pub use sources::{GroundingContext, SourceAggregator, SourceRef};
