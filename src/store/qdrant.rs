//! Remote vector store backed by a Qdrant collection
//!
//! Talks to Qdrant's HTTP API directly with reqwest. The collection is
//! created on connect if it does not exist; a connect failure is the
//! signal dual mode uses to start local-only.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, ChunkMetadata};

use super::{AddReport, SearchFilter, StoreStats, StoreStatus, VectorStore, STATS_SCAN_LIMIT};

/// Origin tag stamped on results from this backend
pub const QDRANT_ORIGIN: &str = "qdrant";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Qdrant-backed vector store over HTTP
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection_name: String,
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<ScoredPoint>,
}

impl QdrantStore {
    /// Connect and ensure the collection exists
    pub async fn connect(
        config: &VectorStoreConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let store = Self {
            client,
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            api_key: config.qdrant_api_key.clone(),
            embedder,
            collection_name: config.collection_name.clone(),
        };
        store.ensure_collection().await?;
        tracing::info!(
            "qdrant store connected at {} (collection {})",
            store.base_url,
            store.collection_name
        );
        Ok(store)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.base_url, self.collection_name, path
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn ensure_collection(&self) -> Result<()> {
        let response = self
            .request(self.client.get(self.url("")))
            .send()
            .await
            .map_err(|e| Error::Backend(format!("qdrant unreachable: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Backend(format!(
                "qdrant collection check failed: HTTP {}",
                response.status()
            )));
        }

        let body = json!({
            "vectors": {
                "size": self.embedder.dimensions(),
                "distance": "Cosine",
            }
        });
        let response = self
            .request(self.client.put(self.url("")))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("qdrant unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Backend(format!(
                "qdrant collection create failed: HTTP {}",
                response.status()
            )));
        }
        tracing::info!("created qdrant collection {}", self.collection_name);
        Ok(())
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.send_json(self.client.post(self.url(path)), body).await
    }

    async fn put_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.send_json(self.client.put(self.url(path)), body).await
    }

    async fn send_json(&self, builder: reqwest::RequestBuilder, body: &Value) -> Result<Value> {
        let response = self
            .request(builder)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("qdrant request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "qdrant returned HTTP {}: {}",
                status, detail
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("qdrant response decode failed: {}", e)))
    }

    fn must_filter(filter: &SearchFilter) -> Option<Value> {
        let mut must = Vec::new();
        if let Some(source) = &filter.source {
            must.push(json!({"key": "source", "match": {"value": source}}));
        }
        if let Some(page) = filter.page {
            must.push(json!({"key": "page", "match": {"value": page}}));
        }
        if must.is_empty() {
            None
        } else {
            Some(json!({"must": must}))
        }
    }

    fn chunk_from_payload(payload: &Value) -> Option<Chunk> {
        let content = payload.get("content")?.as_str()?.to_string();
        let metadata = ChunkMetadata {
            source: payload.get("source")?.as_str()?.to_string(),
            page: payload.get("page").and_then(|p| p.as_u64()).map(|p| p as u32),
            chunk_index: payload.get("chunk_index").and_then(|i| i.as_u64()).unwrap_or(0)
                as usize,
            title: payload
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or_default()
                .to_string(),
            origin: Some(QDRANT_ORIGIN.to_string()),
        };
        Some(Chunk { content, metadata })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<AddReport> {
        if chunks.is_empty() {
            return Ok(AddReport::single(self.name(), 0));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let points: Vec<Value> = chunks
            .iter()
            .zip(&embeddings)
            .map(|(chunk, embedding)| {
                json!({
                    "id": uuid::Uuid::new_v4().to_string(),
                    "vector": embedding,
                    "payload": {
                        "content": chunk.content,
                        "source": chunk.metadata.source,
                        "page": chunk.metadata.page,
                        "chunk_index": chunk.metadata.chunk_index,
                        "title": chunk.metadata.title,
                    }
                })
            })
            .collect();

        self.put_json("/points?wait=true", &json!({"points": points}))
            .await?;
        Ok(AddReport::single(self.name(), chunks.len()))
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Chunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut body = json!({
            "vector": query_embedding,
            "limit": k,
            "with_payload": true,
        });
        if let Some(qdrant_filter) = filter.and_then(Self::must_filter) {
            body["filter"] = qdrant_filter;
        }

        let response = self.post_json("/points/search", &body).await?;
        let parsed: QdrantResponse<Vec<ScoredPoint>> = serde_json::from_value(response)?;

        Ok(parsed
            .result
            .iter()
            .filter_map(|point| point.payload.as_ref().and_then(Self::chunk_from_payload))
            .collect())
    }

    async fn stats(&self) -> StoreStats {
        let counted = async {
            let response = self
                .post_json("/points/count", &json!({"exact": true}))
                .await?;
            let parsed: QdrantResponse<CountResult> = serde_json::from_value(response)?;

            // Distinct sources come from a bounded payload scroll; huge
            // collections undercount past the scan limit.
            let response = self
                .post_json(
                    "/points/scroll",
                    &json!({
                        "limit": STATS_SCAN_LIMIT,
                        "with_payload": ["source"],
                        "with_vector": false,
                    }),
                )
                .await?;
            let scrolled: QdrantResponse<ScrollResult> = serde_json::from_value(response)?;

            let mut sources: Vec<String> = scrolled
                .result
                .points
                .iter()
                .filter_map(|p| p.payload.as_ref())
                .filter_map(|payload| payload.get("source"))
                .filter_map(|s| s.as_str())
                .map(String::from)
                .collect();
            sources.sort();
            sources.dedup();

            Ok::<_, Error>((parsed.result.count, sources))
        }
        .await;

        match counted {
            Ok((total_chunks, sources)) => StoreStats {
                total_chunks,
                unique_sources: sources.len(),
                sources,
                collection_name: self.collection_name.clone(),
                backend: self.name().to_string(),
                status: StoreStatus::Online,
                error: None,
                details: None,
            },
            Err(e) => StoreStats::errored(self.name(), &self.collection_name, e.to_string()),
        }
    }

    async fn delete_by_document(&self, filename: &str) -> bool {
        let body = json!({
            "filter": {
                "must": [{"key": "source", "match": {"value": filename}}]
            }
        });
        match self.post_json("/points/delete?wait=true", &body).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("qdrant delete failed: {}", e);
                false
            }
        }
    }

    async fn clear_all(&self) {
        let result = async {
            let response = self
                .request(self.client.delete(self.url("")))
                .send()
                .await
                .map_err(|e| Error::Backend(format!("qdrant request failed: {}", e)))?;
            if !response.status().is_success() {
                return Err(Error::Backend(format!(
                    "qdrant collection drop failed: HTTP {}",
                    response.status()
                )));
            }
            self.ensure_collection().await
        }
        .await;

        if let Err(e) = result {
            tracing::error!("qdrant clear failed: {}", e);
        }
    }

    fn name(&self) -> &str {
        "Qdrant (Remote)"
    }
}
