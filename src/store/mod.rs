//! Vector store adapters
//!
//! One trait, three implementations: a local SQLite-backed store, a remote
//! Qdrant store, and a dual coordinator that mirrors writes to both and
//! reads with failover. Selection happens through [`build_vector_store`],
//! keyed on the configured provider string.

pub mod dual;
pub mod local;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

pub use dual::DualStore;
pub use local::LocalStore;
pub use qdrant::QdrantStore;

/// Entries scanned when computing `unique_sources` on remote backends.
/// Collections larger than this undercount; accepted approximation.
pub const STATS_SCAN_LIMIT: usize = 5000;

/// Exact-match metadata filter for searches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Restrict to chunks from this source file
    pub source: Option<String>,
    /// Restrict to chunks from this page
    pub page: Option<u32>,
}

impl SearchFilter {
    /// Build from a loose JSON metadata mapping (API boundary shape)
    pub fn from_map(map: &std::collections::HashMap<String, serde_json::Value>) -> Self {
        Self {
            source: map.get("source").and_then(|v| v.as_str()).map(String::from),
            page: map.get("page").and_then(|v| v.as_u64()).map(|p| p as u32),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.page.is_none()
    }
}

/// Outcome of one write leg in a dual write: "OK", "Offline", or an error
/// message, serialized as a plain string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteStatus(String);

impl WriteStatus {
    pub fn ok() -> Self {
        Self("OK".to_string())
    }

    pub fn offline() -> Self {
        Self("Offline".to_string())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn is_ok(&self) -> bool {
        self.0 == "OK"
    }
}

/// Result of an `add_chunks` call, with per-backend status in dual mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReport {
    /// Backend that handled the write
    pub backend: String,
    /// Number of chunks written (by the most complete leg)
    pub total_chunks: usize,
    /// Local leg status (dual mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<WriteStatus>,
    /// Remote leg status (dual mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<WriteStatus>,
}

impl AddReport {
    /// Report for a single-backend write
    pub fn single(backend: &str, total_chunks: usize) -> Self {
        Self {
            backend: backend.to_string(),
            total_chunks,
            local: None,
            remote: None,
        }
    }
}

/// Backend availability as reported in stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Online,
    Offline,
    Error,
}

/// Stats for one backend, or the merged dual view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total chunk count
    pub total_chunks: usize,
    /// Number of distinct source files seen
    pub unique_sources: usize,
    /// Sorted distinct source file names
    pub sources: Vec<String>,
    /// Logical collection name
    pub collection_name: String,
    /// Backend display name
    pub backend: String,
    /// Availability at the time of the call
    pub status: StoreStatus,
    /// Error detail when status is not online
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-backend stats (dual mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<DualStatsDetails>>,
}

impl StoreStats {
    /// Stats for a backend that failed to answer
    pub fn errored(backend: &str, collection_name: &str, error: String) -> Self {
        Self {
            total_chunks: 0,
            unique_sources: 0,
            sources: Vec::new(),
            collection_name: collection_name.to_string(),
            backend: backend.to_string(),
            status: StoreStatus::Error,
            error: Some(error),
            details: None,
        }
    }

    /// Stats for a backend known to be offline
    pub fn offline(backend: &str, collection_name: &str) -> Self {
        Self {
            total_chunks: 0,
            unique_sources: 0,
            sources: Vec::new(),
            collection_name: collection_name.to_string(),
            backend: backend.to_string(),
            status: StoreStatus::Offline,
            error: None,
            details: None,
        }
    }
}

/// Per-backend breakdown attached to dual stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualStatsDetails {
    pub local: StoreStats,
    pub remote: StoreStats,
}

/// Trait for vector storage and similarity search over chunks
///
/// Implementations:
/// - [`LocalStore`]: SQLite-backed store with in-process cosine search
/// - [`QdrantStore`]: remote Qdrant collection over HTTP
/// - [`DualStore`]: both at once, write-mirrored with read failover
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and upsert chunks. Repeated calls with the same content create
    /// duplicate entries; callers replacing a document must delete first.
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<AddReport>;

    /// Nearest-neighbor search, ranked by descending similarity. Returned
    /// chunks are stamped with the producing backend's origin tag. Fewer
    /// than `k` results may be returned.
    async fn search(&self, query: &str, k: usize, filter: Option<&SearchFilter>)
        -> Result<Vec<Chunk>>;

    /// Compute chunk count and the distinct source set. Never fails;
    /// backend errors are folded into the status/error fields.
    async fn stats(&self) -> StoreStats;

    /// Remove all chunks whose source equals `filename`. Returns whether
    /// the deletion executed without error, including when nothing matched.
    async fn delete_by_document(&self, filename: &str) -> bool;

    /// Destroy the backend's contents for this collection. Irreversible.
    async fn clear_all(&self);

    /// Backend name used for logging and origin tags
    fn name(&self) -> &str;
}

/// Construct the configured vector store.
///
/// `dual` mode tolerates a remote that cannot be reached: the failure is
/// logged and the coordinator starts in local-only mode.
pub async fn build_vector_store(
    config: &RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn VectorStore>> {
    let store_config = &config.vector_store;
    match store_config.provider.as_str() {
        "local" => {
            let store = LocalStore::open(store_config, Arc::clone(&embedder)).await?;
            Ok(Arc::new(store))
        }
        "qdrant" => {
            let store = QdrantStore::connect(store_config, Arc::clone(&embedder)).await?;
            Ok(Arc::new(store))
        }
        "dual" => {
            let local: Arc<dyn VectorStore> =
                Arc::new(LocalStore::open(store_config, Arc::clone(&embedder)).await?);

            let remote: Option<Arc<dyn VectorStore>> =
                match QdrantStore::connect(store_config, Arc::clone(&embedder)).await {
                    Ok(store) => Some(Arc::new(store)),
                    Err(e) => {
                        tracing::warn!(
                            "qdrant offline at initialization ({}); operating with local store only",
                            e
                        );
                        None
                    }
                };

            Ok(Arc::new(DualStore::new(
                local,
                remote,
                store_config.collection_name.clone(),
            )))
        }
        other => Err(Error::Config(format!(
            "unknown vector store provider '{}' (expected local, qdrant, or dual)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_from_map_reads_source_and_page() {
        let mut map = std::collections::HashMap::new();
        map.insert("source".to_string(), serde_json::json!("manual.pdf"));
        map.insert("page".to_string(), serde_json::json!(4));

        let filter = SearchFilter::from_map(&map);
        assert_eq!(filter.source.as_deref(), Some("manual.pdf"));
        assert_eq!(filter.page, Some(4));
        assert!(!filter.is_empty());
    }

    #[test]
    fn write_status_serializes_as_plain_string() {
        let report = AddReport {
            backend: "Dual".to_string(),
            total_chunks: 3,
            local: Some(WriteStatus::ok()),
            remote: Some(WriteStatus::offline()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["local"], "OK");
        assert_eq!(json["remote"], "Offline");
    }
}
