//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based seams so the stores and the engine never depend on a
//! concrete API client.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use openai::{OpenAiEmbedder, OpenAiLlm};
