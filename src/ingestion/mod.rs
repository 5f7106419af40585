//! Document ingestion: PDF text extraction and chunking

pub mod chunker;
pub mod pdf;

pub use chunker::TextChunker;
pub use pdf::PdfExtractor;
