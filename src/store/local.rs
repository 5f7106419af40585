//! Local vector store backed by SQLite
//!
//! Chunks and their embeddings live in a single table; similarity search is
//! an in-process cosine scan. Blocking SQLite work runs on the blocking
//! thread pool so the async runtime is never stalled.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

use super::{AddReport, SearchFilter, StoreStats, StoreStatus, VectorStore};

/// Origin tag stamped on results from this backend
pub const LOCAL_ORIGIN: &str = "local";

/// SQLite-backed vector store
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection_name: String,
}

impl LocalStore {
    /// Open (or create) the store at the configured path
    pub async fn open(
        config: &VectorStoreConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if let Some(parent) = config.local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&config.local_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
            collection_name: config.collection_name.clone(),
        };
        store.migrate()?;
        tracing::info!("local store initialized at {}", config.local_path.display());
        Ok(store)
    }

    /// In-memory store for tests
    pub fn in_memory(
        embedder: Arc<dyn EmbeddingProvider>,
        collection_name: &str,
    ) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
            collection_name: collection_name.to_string(),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                page INTEGER,
                chunk_index INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
            "#,
        )?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<AddReport> {
        if chunks.is_empty() {
            return Ok(AddReport::single(self.name(), 0));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let conn = Arc::clone(&self.conn);
        let rows: Vec<(Chunk, Vec<f32>)> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .collect();

        let written = tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn = conn.lock();
            let tx = conn.transaction()?;
            for (chunk, embedding) in &rows {
                tx.execute(
                    "INSERT INTO chunks (source, page, chunk_index, title, content, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        chunk.metadata.source,
                        chunk.metadata.page,
                        chunk.metadata.chunk_index as i64,
                        chunk.metadata.title,
                        chunk.content,
                        embedding_to_blob(embedding),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await
        .map_err(|e| Error::Internal(format!("task join error: {}", e)))??;

        Ok(AddReport::single(self.name(), written))
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Chunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        let conn = Arc::clone(&self.conn);
        let filter = filter.cloned().unwrap_or_default();

        tokio::task::spawn_blocking(move || -> Result<Vec<Chunk>> {
            let conn = conn.lock();

            let mut sql = String::from(
                "SELECT source, page, chunk_index, title, content, embedding FROM chunks",
            );
            let mut clauses = Vec::new();
            let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
            if let Some(source) = &filter.source {
                clauses.push("source = ?");
                args.push(Box::new(source.clone()));
            }
            if let Some(page) = filter.page {
                clauses.push("page = ?");
                args.push(Box::new(page));
            }
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> =
                args.iter().map(|a| a.as_ref()).collect();

            let mut scored: Vec<(f32, Chunk)> = stmt
                .query_map(params.as_slice(), |row| {
                    let source: String = row.get(0)?;
                    let page: Option<u32> = row.get(1)?;
                    let chunk_index: i64 = row.get(2)?;
                    let title: String = row.get(3)?;
                    let content: String = row.get(4)?;
                    let blob: Vec<u8> = row.get(5)?;
                    Ok((source, page, chunk_index, title, content, blob))
                })?
                .filter_map(|row| row.ok())
                .map(|(source, page, chunk_index, title, content, blob)| {
                    let embedding = blob_to_embedding(&blob);
                    let score = cosine_similarity(&query_embedding, &embedding);
                    let chunk = Chunk::new(content, source, page, chunk_index as usize, title)
                        .with_origin(LOCAL_ORIGIN);
                    (score, chunk)
                })
                .collect();

            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(k);
            Ok(scored.into_iter().map(|(_, chunk)| chunk).collect())
        })
        .await
        .map_err(|e| Error::Internal(format!("task join error: {}", e)))?
    }

    async fn stats(&self) -> StoreStats {
        let conn = Arc::clone(&self.conn);
        let collection_name = self.collection_name.clone();
        let backend = self.name().to_string();

        let result = tokio::task::spawn_blocking(move || -> Result<StoreStats> {
            let conn = conn.lock();
            let total_chunks: usize =
                conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;

            let mut stmt = conn.prepare("SELECT DISTINCT source FROM chunks ORDER BY source")?;
            let sources: Vec<String> = stmt
                .query_map([], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect();

            Ok(StoreStats {
                total_chunks,
                unique_sources: sources.len(),
                sources,
                collection_name,
                backend,
                status: StoreStatus::Online,
                error: None,
                details: None,
            })
        })
        .await;

        match result {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => StoreStats::errored(self.name(), &self.collection_name, e.to_string()),
            Err(e) => StoreStats::errored(self.name(), &self.collection_name, e.to_string()),
        }
    }

    async fn delete_by_document(&self, filename: &str) -> bool {
        let conn = Arc::clone(&self.conn);
        let filename = filename.to_string();

        let result = tokio::task::spawn_blocking(move || -> Result<usize> {
            let conn = conn.lock();
            let removed = conn.execute("DELETE FROM chunks WHERE source = ?1", params![filename])?;
            Ok(removed)
        })
        .await;

        match result {
            Ok(Ok(removed)) => {
                tracing::debug!("local store removed {} chunks", removed);
                true
            }
            Ok(Err(e)) => {
                tracing::error!("local delete failed: {}", e);
                false
            }
            Err(e) => {
                tracing::error!("local delete task failed: {}", e);
                false
            }
        }
    }

    async fn clear_all(&self) {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.lock();
            conn.execute("DELETE FROM chunks", [])?;
            Ok(())
        })
        .await;

        if let Ok(Err(e)) = result {
            tracing::error!("local clear failed: {}", e);
        }
    }

    fn name(&self) -> &str {
        "SQLite (Local)"
    }
}

/// Little-endian f32 encoding for embedding blobs
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
