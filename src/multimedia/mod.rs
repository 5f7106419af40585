//! Multimedia association engine
//!
//! Maps documents, pages, and keywords to media items (images, videos,
//! gifs) and enriches retrieved chunks with them.

pub mod enrich;
pub mod index;

pub use enrich::enrich_sources;
pub use index::{KeywordMatch, MultimediaIndex, MultimediaStats};

use serde::{Deserialize, Serialize};

/// Kind of media attached to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Gif,
}

impl MediaType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// One piece of media. The URL is the identity used for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Duration in seconds, for videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl MediaItem {
    pub fn new(media_type: MediaType, url: impl Into<String>) -> Self {
        Self {
            media_type,
            url: url.into(),
            title: None,
            description: None,
            thumbnail_url: None,
            duration: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A grouping of media attached to a document, optionally narrowed to a
/// page and tagged with a section label and keywords.
///
/// `page_number: None` is a document-wide wildcard, not page zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAssociation {
    pub document_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub media_items: Vec<MediaItem>,
}
