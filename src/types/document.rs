//! Document, page, and chunk types with source tracking

use serde::{Deserialize, Serialize};

/// Text content of a single PDF page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// Extracted text
    pub text: String,
    /// Page number (1-indexed)
    pub page_number: u32,
}

/// An extracted PDF document: paginated text plus file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfDocument {
    /// File name (base name, no directory prefix)
    pub filename: String,
    /// Document title (PDF metadata or file stem)
    pub title: String,
    /// SHA-256 of the file contents
    pub file_hash: String,
    /// Pages with non-empty text
    pub pages: Vec<PageText>,
}

impl PdfDocument {
    /// Total number of extracted pages
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }
}

/// Metadata attached to every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document file name
    pub source: String,
    /// Page number the chunk came from (None for unpaginated text)
    #[serde(
        serialize_with = "serialize_page",
        deserialize_with = "deserialize_page",
        default
    )]
    pub page: Option<u32>,
    /// Chunk index within its page
    pub chunk_index: usize,
    /// Document title
    pub title: String,
    /// Which backend produced this chunk in a search result.
    /// Unset on freshly created chunks; stamped by the store adapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// A bounded span of document text, the unit of embedding and retrieval.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content
    pub content: String,
    /// Positional and source metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        content: String,
        source: String,
        page: Option<u32>,
        chunk_index: usize,
        title: String,
    ) -> Self {
        Self {
            content,
            metadata: ChunkMetadata {
                source,
                page,
                chunk_index,
                title,
                origin: None,
            },
        }
    }

    /// Stamp the backend origin tag onto this chunk
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.metadata.origin = Some(origin.to_string());
        self
    }
}

/// Pages without a number serialize as "N/A", matching the API contract
fn serialize_page<S>(page: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match page {
        Some(n) => serializer.serialize_u32(*n),
        None => serializer.serialize_str("N/A"),
    }
}

/// Accepts a number, null, or the "N/A" marker
fn deserialize_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => Ok(n.as_u64().map(|n| n as u32)),
        _ => Ok(None),
    }
}
