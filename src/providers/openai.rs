//! OpenAI-compatible API clients for embeddings and answer generation
//!
//! One shared HTTP client configured with the request timeout; failed
//! requests are retried up to `max_retries` times before surfacing an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Shared request plumbing for both providers
#[derive(Clone)]
struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiClient {
    fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    /// POST a JSON body, retrying transient failures
    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::warn!("retrying {} (attempt {}/{})", path, attempt, self.max_retries);
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }

            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json().await?);
                }
                Ok(response) => {
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    // Client errors will not improve on retry
                    if status.is_client_error() {
                        return Err(Error::Llm(format!("{} returned {}: {}", path, status, detail)));
                    }
                    last_error = Some(Error::Llm(format!("{} returned {}: {}", path, status, detail)));
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(Error::Llm(format!("{} timed out", path)));
                }
                Err(e) => {
                    last_error = Some(Error::Llm(format!("{} failed: {}", path, e)));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Llm(format!("{} failed", path))))
    }
}

/// Embedding provider backed by an OpenAI-compatible /embeddings endpoint
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(config)?,
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut embeddings = self.embed_batch(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::Llm("embeddings response was empty".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.iter().map(|s| s.as_str()).collect(),
        };
        let mut response: EmbeddingResponse =
            self.client.post_json("/embeddings", &request).await?;

        // The API does not guarantee input order
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai-embeddings"
    }
}

/// Answer generation through an OpenAI-compatible /chat/completions endpoint
pub struct OpenAiLlm {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(config)?,
            model: config.generate_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response: ChatCompletionResponse =
            self.client.post_json("/chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm("completion response had no choices".to_string()))
    }

    fn name(&self) -> &str {
        "openai-chat"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
