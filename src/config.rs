//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// OpenAI-compatible API configuration (embeddings + LLM)
    #[serde(default)]
    pub llm: LlmConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Vector store configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    /// Multimedia association configuration
    #[serde(default)]
    pub multimedia: MultimediaConfig,
    /// Chat configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Data paths
    #[serde(default)]
    pub paths: PathsConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides. Missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("failed to parse {}: {}", p.display(), e)))?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.vector_store.qdrant_url = url;
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            self.vector_store.qdrant_api_key = Some(key);
        }
        if let Ok(provider) = std::env::var("VECTOR_STORE_PROVIDER") {
            self.vector_store.provider = provider;
        }
    }

    /// Validate that the configuration can serve traffic.
    /// A missing API credential is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.is_empty() {
            return Err(Error::Config(
                "OPENAI_API_KEY not set; configure the environment variable or the [llm] section"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Create the data directories this configuration refers to
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.pdfs_dir)?;
        std::fs::create_dir_all(&self.paths.data_dir)?;
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Public base URL used when building document links
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8005,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            public_url: "http://localhost:8005".to_string(),
        }
    }
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// API key (usually injected via OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Embedding dimensions (1536 for text-embedding-3-small)
    pub embedding_dimensions: usize,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            generate_model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of chunks retrieved per query
    pub default_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_k: 6 }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Backend selector: "local", "qdrant", or "dual"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Logical collection name shared by both backends
    pub collection_name: String,
    /// Path to the local SQLite store
    pub local_path: PathBuf,
    /// Qdrant server URL
    pub qdrant_url: String,
    /// Qdrant API key (optional)
    #[serde(default)]
    pub qdrant_api_key: Option<String>,
}

fn default_provider() -> String {
    "local".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            collection_name: "pdf_documents".to_string(),
            local_path: default_data_dir().join("vectors.db"),
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_api_key: None,
        }
    }
}

/// Multimedia association configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultimediaConfig {
    /// Enable multimedia enrichment of answers
    pub enabled: bool,
    /// Path to the JSON association file
    pub config_file: PathBuf,
}

impl Default for MultimediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            config_file: default_data_dir().join("multimedia_config.json"),
        }
    }
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum messages kept per session
    pub max_history: usize,
    /// Number of trailing messages included in the prompt
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            history_window: 6,
        }
    }
}

/// Data paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root data directory
    pub data_dir: PathBuf,
    /// Directory of stored PDF files (served at /pdfs)
    pub pdfs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            pdfs_dir: data_dir.join("pdfs"),
            data_dir,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mediarag")
}
