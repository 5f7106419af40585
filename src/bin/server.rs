//! RAG server binary
//!
//! Run with: cargo run --bin mediarag-server [config.toml]

use std::path::PathBuf;

use mediarag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediarag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file as the first argument
    let config_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;
    config.validate()?;
    config.ensure_directories()?;

    tracing::info!("configuration loaded");
    tracing::info!("  - embedding model: {}", config.llm.embedding_model);
    tracing::info!("  - generation model: {}", config.llm.generate_model);
    tracing::info!("  - vector store: {}", config.vector_store.provider);
    tracing::info!("  - collection: {}", config.vector_store.collection_name);
    tracing::info!("  - chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - pdf directory: {}", config.paths.pdfs_dir.display());

    let address = format!("{}:{}", config.server.host, config.server.port);
    let server = RagServer::new(config).await?;

    println!("mediarag server starting");
    println!("  API: http://{}/api/info", address);
    println!("  Health: http://{}/health", address);
    println!("Press Ctrl+C to stop");

    server.start().await?;

    Ok(())
}
