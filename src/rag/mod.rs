//! Retrieval layer.
//!
//! This module provides:
//! - `EmbeddingStore`: the chunk/vector store loaded from disk
//! - `VectorIndex`: exact nearest-neighbour search under a chosen `Metric`
//! - `ContextRetriever`: query embedding plus search, returning ranked chunks
//! - `split_into_chunks`: document chunking for the vectorizer

mod chunker;
mod index;
mod retriever;
mod store;

pub use chunker::{split_into_chunks, ChunkerConfig, TextChunk};
pub use index::{Metric, SearchHit, VectorIndex};
pub use retriever::{ContextRetriever, RetrievedChunk, RetrievedContext};
pub use store::{Chunk, EmbeddingStore};
