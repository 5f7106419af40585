//! Dual store coordinator
//!
//! Mirrors writes to a local and a remote backend and reads remote-first
//! with local fallback. A remote search failure (or a construction failure)
//! marks the remote offline for the rest of the process lifetime; write
//! failures are reported per leg but retried on the next call.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::types::Chunk;

use super::{
    AddReport, DualStatsDetails, SearchFilter, StoreStats, StoreStatus, VectorStore, WriteStatus,
};

/// Write-mirrored pair of stores with read failover
pub struct DualStore {
    local: Arc<dyn VectorStore>,
    remote: Option<Arc<dyn VectorStore>>,
    remote_online: AtomicBool,
    collection_name: String,
}

impl DualStore {
    /// Build the coordinator. `remote: None` means the remote was already
    /// unreachable at startup and the store runs local-only.
    pub fn new(
        local: Arc<dyn VectorStore>,
        remote: Option<Arc<dyn VectorStore>>,
        collection_name: String,
    ) -> Self {
        let remote_online = AtomicBool::new(remote.is_some());
        Self {
            local,
            remote,
            remote_online,
            collection_name,
        }
    }

    fn remote_if_online(&self) -> Option<&Arc<dyn VectorStore>> {
        if self.remote_online.load(Ordering::Acquire) {
            self.remote.as_ref()
        } else {
            None
        }
    }

    /// One-way transition; the remote never comes back without a restart
    fn mark_remote_offline(&self, context: &str, error: &crate::error::Error) {
        if self.remote_online.swap(false, Ordering::AcqRel) {
            tracing::warn!(
                "remote store failed during {} ({}); switching to local-only until restart",
                context,
                error
            );
        }
    }

    fn display_name(&self) -> &'static str {
        if self.remote_online.load(Ordering::Acquire) {
            "Dual (Hybrid)"
        } else {
            "Dual (Local Fallback)"
        }
    }
}

#[async_trait]
impl VectorStore for DualStore {
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<AddReport> {
        let (local_status, local_count) = match self.local.add_chunks(chunks).await {
            Ok(report) => (WriteStatus::ok(), report.total_chunks),
            Err(e) => {
                tracing::error!("local write failed: {}", e);
                (WriteStatus::failed(e.to_string()), 0)
            }
        };

        // A failed write is reported per leg but does not take the remote
        // offline; only search failures (or construction) do. The next
        // write attempts the remote again.
        let (remote_status, remote_count) = match self.remote_if_online() {
            Some(remote) => match remote.add_chunks(chunks).await {
                Ok(report) => (WriteStatus::ok(), report.total_chunks),
                Err(e) => {
                    tracing::error!("remote write failed: {}", e);
                    (WriteStatus::failed(e.to_string()), 0)
                }
            },
            None => (WriteStatus::offline(), 0),
        };

        Ok(AddReport {
            backend: self.display_name().to_string(),
            total_chunks: local_count.max(remote_count),
            local: Some(local_status),
            remote: Some(remote_status),
        })
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Chunk>> {
        if let Some(remote) = self.remote_if_online() {
            match remote.search(query, k, filter).await {
                Ok(chunks) => return Ok(chunks),
                Err(e) => self.mark_remote_offline("search", &e),
            }
        }
        self.local.search(query, k, filter).await
    }

    async fn stats(&self) -> StoreStats {
        let local = self.local.stats().await;
        let remote = match self.remote_if_online() {
            Some(remote) => remote.stats().await,
            None => StoreStats::offline("Qdrant (Remote)", &self.collection_name),
        };

        // Merged view: union of sources, max of counts. The backends can
        // legitimately disagree after a partial outage.
        let mut sources = local.sources.clone();
        sources.extend(remote.sources.iter().cloned());
        sources.sort();
        sources.dedup();

        StoreStats {
            total_chunks: local.total_chunks.max(remote.total_chunks),
            unique_sources: sources.len(),
            sources,
            collection_name: self.collection_name.clone(),
            backend: self.display_name().to_string(),
            status: if local.status == StoreStatus::Online
                || remote.status == StoreStatus::Online
            {
                StoreStatus::Online
            } else {
                StoreStatus::Error
            },
            error: None,
            details: Some(Box::new(DualStatsDetails { local, remote })),
        }
    }

    async fn delete_by_document(&self, filename: &str) -> bool {
        let local_ok = self.local.delete_by_document(filename).await;
        let remote_ok = match self.remote_if_online() {
            Some(remote) => remote.delete_by_document(filename).await,
            None => false,
        };
        local_ok || remote_ok
    }

    async fn clear_all(&self) {
        self.local.clear_all().await;
        if let Some(remote) = self.remote_if_online() {
            remote.clear_all().await;
        }
    }

    fn name(&self) -> &str {
        self.display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::StoreStatus;
    use crate::types::Chunk;
    use std::sync::atomic::AtomicUsize;

    /// Canned in-memory backend for exercising the coordinator
    struct StubStore {
        origin: &'static str,
        chunk_count: usize,
        sources: Vec<String>,
        fail_search: bool,
        fail_add: bool,
        search_calls: AtomicUsize,
    }

    impl StubStore {
        fn healthy(origin: &'static str, chunk_count: usize, sources: &[&str]) -> Self {
            Self {
                origin,
                chunk_count,
                sources: sources.iter().map(|s| s.to_string()).collect(),
                fail_search: false,
                fail_add: false,
                search_calls: AtomicUsize::new(0),
            }
        }

        fn failing(origin: &'static str) -> Self {
            Self {
                origin,
                chunk_count: 0,
                sources: Vec::new(),
                fail_search: true,
                fail_add: true,
                search_calls: AtomicUsize::new(0),
            }
        }

        fn failing_writes(origin: &'static str) -> Self {
            Self {
                origin,
                chunk_count: 0,
                sources: Vec::new(),
                fail_search: false,
                fail_add: true,
                search_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VectorStore for StubStore {
        async fn add_chunks(&self, chunks: &[Chunk]) -> Result<AddReport> {
            if self.fail_add {
                return Err(Error::Backend("stub write failure".to_string()));
            }
            Ok(AddReport::single(self.origin, chunks.len()))
        }

        async fn search(
            &self,
            _query: &str,
            _k: usize,
            _filter: Option<&SearchFilter>,
        ) -> Result<Vec<Chunk>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_search {
                return Err(Error::Backend("stub search failure".to_string()));
            }
            Ok(vec![Chunk::new(
                "stub content".to_string(),
                "stub.pdf".to_string(),
                Some(1),
                0,
                "Stub".to_string(),
            )
            .with_origin(self.origin)])
        }

        async fn stats(&self) -> StoreStats {
            StoreStats {
                total_chunks: self.chunk_count,
                unique_sources: self.sources.len(),
                sources: self.sources.clone(),
                collection_name: "test".to_string(),
                backend: self.origin.to_string(),
                status: StoreStatus::Online,
                error: None,
                details: None,
            }
        }

        async fn delete_by_document(&self, _filename: &str) -> bool {
            !self.fail_add
        }

        async fn clear_all(&self) {}

        fn name(&self) -> &str {
            self.origin
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| {
                Chunk::new(
                    format!("chunk {}", i),
                    "doc.pdf".to_string(),
                    Some(1),
                    i,
                    "Doc".to_string(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn write_reports_both_legs_when_healthy() {
        let dual = DualStore::new(
            Arc::new(StubStore::healthy("local", 0, &[])),
            Some(Arc::new(StubStore::healthy("qdrant", 0, &[]))),
            "test".to_string(),
        );

        let report = dual.add_chunks(&chunks(3)).await.unwrap();
        assert_eq!(report.total_chunks, 3);
        assert!(report.local.unwrap().is_ok());
        assert!(report.remote.unwrap().is_ok());
        assert_eq!(report.backend, "Dual (Hybrid)");
    }

    #[tokio::test]
    async fn remote_write_failure_is_reported_but_not_permanent() {
        let remote = Arc::new(StubStore::failing_writes("qdrant"));
        let dual = DualStore::new(
            Arc::new(StubStore::healthy("local", 0, &[])),
            Some(Arc::clone(&remote) as Arc<dyn VectorStore>),
            "test".to_string(),
        );

        let report = dual.add_chunks(&chunks(2)).await.unwrap();
        assert_eq!(report.total_chunks, 2);
        assert!(report.local.unwrap().is_ok());
        assert!(!report.remote.clone().unwrap().is_ok());
        assert_ne!(report.remote.unwrap(), WriteStatus::offline());

        // The next write tries the remote again instead of skipping it
        let report = dual.add_chunks(&chunks(1)).await.unwrap();
        assert_ne!(report.remote.unwrap(), WriteStatus::offline());
        assert_eq!(report.backend, "Dual (Hybrid)");
    }

    #[tokio::test]
    async fn write_failure_does_not_divert_reads_from_remote() {
        let local = Arc::new(StubStore::healthy("local", 0, &[]));
        let dual = DualStore::new(
            Arc::clone(&local) as Arc<dyn VectorStore>,
            Some(Arc::new(StubStore::failing_writes("qdrant"))),
            "test".to_string(),
        );

        dual.add_chunks(&chunks(1)).await.unwrap();

        let results = dual.search("query", 5, None).await.unwrap();
        assert_eq!(results[0].metadata.origin.as_deref(), Some("qdrant"));
        assert_eq!(local.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_falls_back_to_local_on_remote_failure() {
        let local = Arc::new(StubStore::healthy("local", 0, &[]));
        let dual = DualStore::new(
            Arc::clone(&local) as Arc<dyn VectorStore>,
            Some(Arc::new(StubStore::failing("qdrant"))),
            "test".to_string(),
        );

        let results = dual.search("query", 5, None).await.unwrap();
        assert_eq!(results[0].metadata.origin.as_deref(), Some("local"));
        assert_eq!(local.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_prefers_remote_when_online() {
        let local = Arc::new(StubStore::healthy("local", 0, &[]));
        let dual = DualStore::new(
            Arc::clone(&local) as Arc<dyn VectorStore>,
            Some(Arc::new(StubStore::healthy("qdrant", 0, &[]))),
            "test".to_string(),
        );

        let results = dual.search("query", 5, None).await.unwrap();
        assert_eq!(results[0].metadata.origin.as_deref(), Some("qdrant"));
        assert_eq!(local.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_search_marks_remote_offline_permanently() {
        let local = Arc::new(StubStore::healthy("local", 0, &[]));
        let remote = Arc::new(StubStore::failing("qdrant"));
        let dual = DualStore::new(
            Arc::clone(&local) as Arc<dyn VectorStore>,
            Some(Arc::clone(&remote) as Arc<dyn VectorStore>),
            "test".to_string(),
        );

        dual.search("first", 5, None).await.unwrap();
        dual.search("second", 5, None).await.unwrap();

        // The remote was tried exactly once
        assert_eq!(remote.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(local.search_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stats_merge_takes_max_counts_and_source_union() {
        let dual = DualStore::new(
            Arc::new(StubStore::healthy("local", 40, &["a.pdf", "b.pdf"])),
            Some(Arc::new(StubStore::healthy("qdrant", 40, &["b.pdf", "c.pdf"]))),
            "test".to_string(),
        );

        let stats = dual.stats().await;
        assert_eq!(stats.total_chunks, 40);
        assert_eq!(
            stats.sources,
            vec!["a.pdf".to_string(), "b.pdf".to_string(), "c.pdf".to_string()]
        );
        assert_eq!(stats.unique_sources, 3);
        assert_eq!(stats.backend, "Dual (Hybrid)");
        assert!(stats.details.is_some());
    }

    #[tokio::test]
    async fn stats_without_remote_reports_local_fallback() {
        let dual = DualStore::new(
            Arc::new(StubStore::healthy("local", 40, &["a.pdf"])),
            None,
            "test".to_string(),
        );

        let stats = dual.stats().await;
        assert_eq!(stats.total_chunks, 40);
        assert_eq!(stats.backend, "Dual (Local Fallback)");
        let details = stats.details.unwrap();
        assert_eq!(details.remote.status, StoreStatus::Offline);
    }

    #[tokio::test]
    async fn delete_succeeds_when_either_leg_succeeds() {
        let dual = DualStore::new(
            Arc::new(StubStore::healthy("local", 0, &[])),
            Some(Arc::new(StubStore::failing("qdrant"))),
            "test".to_string(),
        );
        assert!(dual.delete_by_document("doc.pdf").await);

        let dual = DualStore::new(
            Arc::new(StubStore::failing("local")),
            None,
            "test".to_string(),
        );
        assert!(!dual.delete_by_document("doc.pdf").await);
    }
}
