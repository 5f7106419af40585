//! Request types for the RAG API

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounds applied to every user-supplied `k`
pub const MIN_K: usize = 1;
pub const MAX_K: usize = 20;

/// Query request for RAG question answering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (1..=20, default from config)
    #[serde(default)]
    pub k: Option<usize>,

    /// Whether to include source documents in the response (default: true)
    #[serde(default = "default_true")]
    pub include_sources: bool,

    /// Whether to include associated multimedia (default: true)
    #[serde(default = "default_true")]
    pub include_media: bool,
}

impl QueryRequest {
    /// Create a new query with defaults
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            k: None,
            include_sources: true,
            include_media: true,
        }
    }

    /// Resolve and clamp `k` against the configured default
    pub fn effective_k(&self, default_k: usize) -> usize {
        self.k.unwrap_or(default_k).clamp(MIN_K, MAX_K)
    }
}

fn default_true() -> bool {
    true
}

/// Raw similarity search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Search query text
    pub query: String,

    /// Number of chunks to return (1..=20, default: 5)
    #[serde(default = "default_search_k")]
    pub k: usize,

    /// Exact-match metadata filter (e.g. {"source": "manual.pdf", "page": 3})
    #[serde(default)]
    pub filter: Option<HashMap<String, serde_json::Value>>,
}

impl SearchRequest {
    /// Clamp `k` to the allowed bounds
    pub fn effective_k(&self) -> usize {
        self.k.clamp(MIN_K, MAX_K)
    }
}

fn default_search_k() -> usize {
    5
}

/// Chat request with session tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Session identifier; a new session is created if unknown
    pub session_id: String,

    /// User message
    pub message: String,

    /// Number of chunks to retrieve (optional)
    #[serde(default)]
    pub k: Option<usize>,
}
