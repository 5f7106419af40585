//! Application state for the HTTP server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::chat::ChatSession;
use crate::config::RagConfig;
use crate::engine::RagEngine;
use crate::error::Result;
use crate::multimedia::MultimediaIndex;
use crate::providers::{openai::OpenAiEmbedder, openai::OpenAiLlm, EmbeddingProvider, LlmProvider};
use crate::store::{build_vector_store, VectorStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    engine: RagEngine,
    store: Arc<dyn VectorStore>,
    multimedia: Arc<MultimediaIndex>,
    /// Chat sessions, keyed by session id
    sessions: DashMap<String, ChatSession>,
    ready: RwLock<bool>,
}

impl AppState {
    /// Wire up providers, stores, and the engine from configuration
    pub async fn new(config: RagConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedder::new(&config.llm)?);
        tracing::info!(
            "embedding provider initialized ({}, {} dims)",
            config.llm.embedding_model,
            embedder.dimensions()
        );

        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiLlm::new(&config.llm)?);
        tracing::info!("llm provider initialized ({})", llm.model());

        let store = build_vector_store(&config, Arc::clone(&embedder)).await?;
        tracing::info!("vector store initialized ({})", store.name());

        let multimedia = Arc::new(MultimediaIndex::load(&config.multimedia.config_file));

        let engine = RagEngine::new(
            config.clone(),
            Arc::clone(&store),
            llm,
            Arc::clone(&multimedia),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                store,
                multimedia,
                sessions: DashMap::new(),
                ready: RwLock::new(true),
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> &RagEngine {
        &self.inner.engine
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.inner.store
    }

    pub fn multimedia(&self) -> &Arc<MultimediaIndex> {
        &self.inner.multimedia
    }

    pub fn sessions(&self) -> &DashMap<String, ChatSession> {
        &self.inner.sessions
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
