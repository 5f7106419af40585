//! RAG engine
//!
//! Ties retrieval, generation, and multimedia enrichment together. The
//! HTTP layer delegates here; the engine owns no transport concerns.

pub mod prompt;

use std::path::Path;
use std::sync::Arc;

use crate::chat::ChatMessage;
use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::{PdfExtractor, TextChunker};
use crate::multimedia::{enrich_sources, MultimediaIndex};
use crate::providers::LlmProvider;
use crate::store::VectorStore;
use crate::types::{
    make_excerpt, Chunk, IngestStats, QueryRequest, QueryResponse, SearchRequest, SearchResponse,
    SourceInfo,
};

/// Orchestrates the query pipeline: retrieve, generate, enrich
pub struct RagEngine {
    config: RagConfig,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
    multimedia: Arc<MultimediaIndex>,
    extractor: PdfExtractor,
    chunker: TextChunker,
}

impl RagEngine {
    pub fn new(
        config: RagConfig,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmProvider>,
        multimedia: Arc<MultimediaIndex>,
    ) -> Self {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        Self {
            config,
            store,
            llm,
            multimedia,
            extractor: PdfExtractor::new(),
            chunker,
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn multimedia(&self) -> &Arc<MultimediaIndex> {
        &self.multimedia
    }

    /// Extract, chunk, and index a PDF file
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestStats> {
        let document = self.extractor.extract_from_file(path)?;
        self.ingest_document_chunks(&document.filename, document.pages.len(), {
            self.chunker.chunk_document(&document)
        })
        .await
    }

    /// Extract, chunk, and index an in-memory PDF (upload path)
    pub async fn ingest_bytes(&self, filename: &str, bytes: &[u8]) -> Result<IngestStats> {
        let document = self.extractor.extract_from_bytes(bytes, filename)?;
        self.ingest_document_chunks(&document.filename, document.pages.len(), {
            self.chunker.chunk_document(&document)
        })
        .await
    }

    async fn ingest_document_chunks(
        &self,
        filename: &str,
        total_pages: usize,
        chunks: Vec<Chunk>,
    ) -> Result<IngestStats> {
        tracing::info!(
            "ingesting {} ({} pages, {} chunks)",
            filename,
            total_pages,
            chunks.len()
        );
        let write_report = self.store.add_chunks(&chunks).await?;
        Ok(IngestStats {
            total_documents: 1,
            total_pages,
            total_chunks: chunks.len(),
            write_report,
        })
    }

    /// Answer a one-shot question
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let k = request.effective_k(self.config.retrieval.default_k);
        let chunks = self.store.search(&request.question, k, None).await?;
        self.answer(&request.question, chunks, None, request).await
    }

    /// Answer a chat turn, with recent history in the prompt
    pub async fn chat_answer(
        &self,
        history: &[ChatMessage],
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        let k = request.effective_k(self.config.retrieval.default_k);
        let chunks = self.store.search(&request.question, k, None).await?;
        self.answer(&request.question, chunks, Some(history), request)
            .await
    }

    async fn answer(
        &self,
        question: &str,
        chunks: Vec<Chunk>,
        history: Option<&[ChatMessage]>,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        if chunks.is_empty() {
            return Ok(QueryResponse::not_found(question.to_string()));
        }

        let prompt = match history {
            Some(history) => {
                let window = self.config.chat.history_window;
                let start = history.len().saturating_sub(window);
                prompt::build_chat_prompt(&history[start..], question, &chunks)
            }
            None => prompt::build_query_prompt(question, &chunks),
        };

        let (answer, error) = match self.llm.generate(&prompt).await {
            Ok(answer) => (answer, None),
            Err(e) => {
                tracing::error!("answer generation failed: {}", e);
                (
                    "Sorry, I ran into an error while generating the answer. Please try again."
                        .to_string(),
                    Some(e.to_string()),
                )
            }
        };

        let mut sources: Vec<SourceInfo> = chunks
            .iter()
            .map(|chunk| self.source_info(chunk))
            .collect();

        let media = if self.config.multimedia.enabled && request.include_media {
            enrich_sources(&self.multimedia, question, &mut sources)
        } else {
            Vec::new()
        };

        let num_sources = sources.len();
        if !request.include_sources {
            sources.clear();
        }

        Ok(QueryResponse {
            question: question.to_string(),
            answer,
            sources,
            num_sources,
            has_media: !media.is_empty(),
            media,
            error,
        })
    }

    fn source_info(&self, chunk: &Chunk) -> SourceInfo {
        SourceInfo {
            source: chunk.metadata.source.clone(),
            page: chunk.metadata.page,
            title: chunk.metadata.title.clone(),
            excerpt: make_excerpt(&chunk.content),
            pdf_url: self.pdf_url(&chunk.metadata.source),
            media: Vec::new(),
        }
    }

    /// Public link to the served PDF, percent-encoded for odd filenames
    fn pdf_url(&self, filename: &str) -> String {
        match url::Url::parse(&self.config.server.public_url) {
            Ok(mut base) => {
                if let Ok(mut segments) = base.path_segments_mut() {
                    segments.pop_if_empty().push("pdfs").push(filename);
                }
                base.to_string()
            }
            Err(_) => format!(
                "{}/pdfs/{}",
                self.config.server.public_url.trim_end_matches('/'),
                filename
            ),
        }
    }

    /// Raw similarity search, no generation
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let filter = request
            .filter
            .as_ref()
            .map(crate::store::SearchFilter::from_map)
            .filter(|f| !f.is_empty());
        let chunks = self
            .store
            .search(&request.query, request.effective_k(), filter.as_ref())
            .await?;
        Ok(SearchResponse {
            query: request.query.clone(),
            total_results: chunks.len(),
            chunks,
        })
    }

    /// Drop a document's chunks from every backend
    pub async fn delete_document(&self, filename: &str) -> bool {
        self.store.delete_by_document(filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{AddReport, SearchFilter, StoreStats, StoreStatus};
    use async_trait::async_trait;

    struct FixedStore {
        chunks: Vec<Chunk>,
        last_k: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn add_chunks(&self, chunks: &[Chunk]) -> Result<AddReport> {
            Ok(AddReport::single("fixed", chunks.len()))
        }

        async fn search(
            &self,
            _query: &str,
            k: usize,
            _filter: Option<&SearchFilter>,
        ) -> Result<Vec<Chunk>> {
            self.last_k.store(k, std::sync::atomic::Ordering::SeqCst);
            Ok(self.chunks.clone())
        }

        async fn stats(&self) -> StoreStats {
            StoreStats {
                total_chunks: self.chunks.len(),
                unique_sources: 0,
                sources: Vec::new(),
                collection_name: "test".to_string(),
                backend: "fixed".to_string(),
                status: StoreStatus::Online,
                error: None,
                details: None,
            }
        }

        async fn delete_by_document(&self, _filename: &str) -> bool {
            true
        }

        async fn clear_all(&self) {}

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FixedLlm {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            if self.fail {
                Err(Error::Llm("model timed out".to_string()))
            } else {
                Ok("a generated answer".to_string())
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-model"
        }
    }

    fn engine(chunks: Vec<Chunk>, llm_fails: bool) -> (RagEngine, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let multimedia = Arc::new(MultimediaIndex::load(dir.path().join("media.json")));
        let engine = RagEngine::new(
            RagConfig::default(),
            Arc::new(FixedStore {
                chunks,
                last_k: std::sync::atomic::AtomicUsize::new(0),
            }),
            Arc::new(FixedLlm { fail: llm_fails }),
            multimedia,
        );
        (engine, dir)
    }

    fn chunk(content: &str, source: &str, page: Option<u32>) -> Chunk {
        Chunk::new(
            content.to_string(),
            source.to_string(),
            page,
            0,
            "Title".to_string(),
        )
    }

    fn request(question: &str) -> QueryRequest {
        QueryRequest {
            question: question.to_string(),
            k: None,
            include_sources: true,
            include_media: true,
        }
    }

    #[tokio::test]
    async fn empty_retrieval_yields_canned_answer() {
        let (engine, _dir) = engine(Vec::new(), false);
        let response = engine.query(&request("anything")).await.unwrap();
        assert_eq!(response.num_sources, 0);
        assert!(response.answer.contains("could not find"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn successful_query_carries_sources_and_links() {
        let (engine, _dir) = engine(vec![chunk("some content", "guide.pdf", Some(2))], false);
        let response = engine.query(&request("a question")).await.unwrap();

        assert_eq!(response.answer, "a generated answer");
        assert_eq!(response.num_sources, 1);
        assert_eq!(response.sources[0].source, "guide.pdf");
        assert_eq!(
            response.sources[0].pdf_url,
            "http://localhost:8005/pdfs/guide.pdf"
        );
    }

    #[tokio::test]
    async fn llm_failure_becomes_apology_with_error_field() {
        let (engine, _dir) = engine(vec![chunk("content", "doc.pdf", Some(1))], true);
        let response = engine.query(&request("a question")).await.unwrap();

        assert!(response.answer.starts_with("Sorry"));
        assert!(response.error.unwrap().contains("timed out"));
        // Sources are still returned alongside the failure
        assert_eq!(response.num_sources, 1);
    }

    #[tokio::test]
    async fn include_sources_false_omits_the_list_but_keeps_the_count() {
        let (engine, _dir) = engine(vec![chunk("content", "doc.pdf", Some(1))], false);
        let mut req = request("a question");
        req.include_sources = false;
        let response = engine.query(&req).await.unwrap();

        assert!(response.sources.is_empty());
        assert_eq!(response.num_sources, 1);
    }

    #[tokio::test]
    async fn search_k_reaches_the_store_clamped() {
        let store = Arc::new(FixedStore {
            chunks: Vec::new(),
            last_k: std::sync::atomic::AtomicUsize::new(0),
        });
        let dir = tempfile::TempDir::new().unwrap();
        let engine = RagEngine::new(
            RagConfig::default(),
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(FixedLlm { fail: false }),
            Arc::new(MultimediaIndex::load(dir.path().join("media.json"))),
        );

        let mut request = SearchRequest {
            query: "routing".to_string(),
            k: 0,
            filter: None,
        };
        engine.search(&request).await.unwrap();
        assert_eq!(store.last_k.load(std::sync::atomic::Ordering::SeqCst), 1);

        request.k = 100;
        engine.search(&request).await.unwrap();
        assert_eq!(store.last_k.load(std::sync::atomic::Ordering::SeqCst), 20);
    }

    #[test]
    fn pdf_url_percent_encodes_filenames() {
        let (engine, _dir) = engine(Vec::new(), false);
        assert_eq!(
            engine.pdf_url("network guide.pdf"),
            "http://localhost:8005/pdfs/network%20guide.pdf"
        );
    }
}
