//! mediarag: RAG service over indexed PDFs
//!
//! Extracts text from PDFs, chunks and embeds it into one or two vector
//! stores (local SQLite, remote Qdrant, or both with failover), answers
//! questions by retrieving relevant chunks and prompting a language model,
//! and enriches answers with multimedia associated by document, page, or
//! keyword.

pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod multimedia;
pub mod providers;
pub mod server;
pub mod store;
pub mod types;

pub use config::RagConfig;
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use multimedia::{MediaAssociation, MediaItem, MediaType, MultimediaIndex};
pub use store::{DualStore, LocalStore, QdrantStore, VectorStore};
pub use types::{
    document::{Chunk, ChunkMetadata, PdfDocument},
    query::{QueryRequest, SearchRequest},
    response::{QueryResponse, SearchResponse},
};
