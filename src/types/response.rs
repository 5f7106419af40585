//! Response types for the RAG API

use serde::{Deserialize, Serialize};

use crate::multimedia::MediaItem;
use crate::store::AddReport;
use crate::types::Chunk;

/// Maximum excerpt length before truncation
pub const EXCERPT_LIMIT: usize = 300;

/// A retrieved source document reference, optionally enriched with media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Source document file name
    pub source: String,
    /// Page number, if the chunk is paginated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Document title
    pub title: String,
    /// First 300 characters of the chunk content
    pub excerpt: String,
    /// Link to the served PDF file
    pub pdf_url: String,
    /// Media directly associated with this document/page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaItem>,
}

/// Answer to a RAG query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The original question
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Source documents backing the answer
    pub sources: Vec<SourceInfo>,
    /// Number of retrieved chunks
    pub num_sources: usize,
    /// Deduplicated media across all sources
    pub media: Vec<MediaItem>,
    /// Whether any media was attached
    pub has_media: bool,
    /// Set when the language model failed or timed out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Canned response when retrieval finds nothing relevant
    pub fn not_found(question: String) -> Self {
        Self {
            question,
            answer: "Sorry, I could not find relevant information in the indexed documents."
                .to_string(),
            sources: Vec::new(),
            num_sources: 0,
            media: Vec::new(),
            has_media: false,
            error: None,
        }
    }
}

/// Raw search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The original query
    pub query: String,
    /// Matching chunks with metadata
    pub chunks: Vec<Chunk>,
    /// Number of matches returned
    pub total_results: usize,
}

/// Chat turn response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Session the turn belongs to
    pub session_id: String,
    /// The user message
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Source documents backing the answer
    pub sources: Vec<SourceInfo>,
    /// Number of retrieved chunks
    pub num_sources: usize,
    /// Deduplicated media across all sources
    pub media: Vec<MediaItem>,
    /// Whether any media was attached
    pub has_media: bool,
    /// Set when the language model failed or timed out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of an ingestion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of documents processed
    pub total_documents: usize,
    /// Number of pages extracted
    pub total_pages: usize,
    /// Number of chunks written
    pub total_chunks: usize,
    /// Per-backend write status
    pub write_report: AddReport,
}

/// Truncate content to an excerpt of at most [`EXCERPT_LIMIT`] characters
pub fn make_excerpt(content: &str) -> String {
    if content.chars().count() <= EXCERPT_LIMIT {
        return content.to_string();
    }
    let truncated: String = content.chars().take(EXCERPT_LIMIT).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_not_truncated() {
        assert_eq!(make_excerpt("hello"), "hello");
    }

    #[test]
    fn long_content_gets_ellipsis() {
        let long = "x".repeat(400);
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.chars().count(), EXCERPT_LIMIT + 3);
        assert!(excerpt.ends_with("..."));
    }
}
