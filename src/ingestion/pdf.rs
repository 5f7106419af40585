//! PDF text extraction
//!
//! Extracts per-page text plus file metadata. Pages with no extractable
//! text are skipped.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{PageText, PdfDocument};

/// Extracts paginated text from PDF files
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text and metadata from a PDF file on disk
    pub fn extract_from_file(&self, path: &Path) -> Result<PdfDocument> {
        if !path.exists() {
            return Err(Error::NotFound(format!("PDF not found: {}", path.display())));
        }
        if path.extension().map_or(true, |e| !e.eq_ignore_ascii_case("pdf")) {
            return Err(Error::Invalid(format!("not a PDF file: {}", path.display())));
        }

        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut document = self.extract_from_bytes(&bytes, &filename)?;
        document.file_hash = file_hash(&bytes);
        Ok(document)
    }

    /// Extract text from in-memory PDF bytes (used by the upload endpoint)
    pub fn extract_from_bytes(&self, bytes: &[u8], filename: &str) -> Result<PdfDocument> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| Error::PdfExtraction(format!("{}: {}", filename, e)))?;

        let mut pages = Vec::new();
        for (page_number, _) in doc.get_pages() {
            // Individual page failures are tolerated; a scanned or image-only
            // page simply yields nothing.
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("failed to extract page {} of {}: {}", page_number, filename, e);
                    continue;
                }
            };

            let cleaned = clean_text(&text);
            if !cleaned.trim().is_empty() {
                pages.push(PageText {
                    text: cleaned,
                    page_number,
                });
            }
        }

        if pages.is_empty() {
            return Err(Error::PdfExtraction(format!(
                "no text extracted from {}",
                filename
            )));
        }

        let title = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());

        Ok(PdfDocument {
            filename: filename.to_string(),
            title,
            file_hash: file_hash(bytes),
            pages,
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize whitespace noise from extraction
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

fn file_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_blank_runs() {
        let raw = "line one\n\n\n\nline two   \n";
        let cleaned = clean_text(raw);
        assert_eq!(cleaned, "line one\n\nline two\n");
    }

    #[test]
    fn rejects_non_pdf_extension() {
        let extractor = PdfExtractor::new();
        let err = extractor
            .extract_from_file(Path::new("notes.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_) | Error::Invalid(_)));
    }
}
