//! Shared data types

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkMetadata, PageText, PdfDocument};
pub use query::{ChatRequest, QueryRequest, SearchRequest};
pub use response::{
    make_excerpt, ChatResponse, IngestStats, QueryResponse, SearchResponse, SourceInfo,
};
