//! Text chunking with recursive separator fallback
//!
//! Splits page text into overlapping fixed-size chunks. Splitting prefers
//! paragraph breaks, then line breaks, then sentence ends, then spaces, and
//! finally falls back to a hard character split.

use crate::types::{Chunk, PdfDocument};

/// Separators tried in order; the empty string is the hard fallback
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Overlap larger than the chunk size is clamped.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size / 2),
        }
    }

    /// Chunk an extracted document page by page, attaching source metadata
    pub fn chunk_document(&self, doc: &PdfDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in &doc.pages {
            for (index, text) in self.split_text(&page.text).into_iter().enumerate() {
                chunks.push(Chunk::new(
                    text,
                    doc.filename.clone(),
                    Some(page.page_number),
                    index,
                    doc.title.clone(),
                ));
            }
        }
        chunks
    }

    /// Split raw text into overlapping chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with_separators(text, &SEPARATORS)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn split_with_separators(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);

        if separator.is_empty() {
            return self.hard_split(text);
        }

        let pieces = split_keeping_separator(text, separator);

        // Oversized pieces get re-split with the next separator in line;
        // everything else is merged up to the target size with overlap.
        let mut final_chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in pieces {
            if piece.chars().count() <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            self.merge_pieces(&mut pending, &mut final_chunks);
            final_chunks.extend(self.split_with_separators(&piece, remaining));
        }
        self.merge_pieces(&mut pending, &mut final_chunks);

        final_chunks
    }

    /// Merge accumulated pieces into chunks of at most `chunk_size`,
    /// carrying `overlap` characters of trailing context forward.
    fn merge_pieces(&self, pending: &mut Vec<String>, out: &mut Vec<String>) {
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for piece in pending.drain(..) {
            let piece_len = piece.chars().count();

            if current_len + piece_len > self.chunk_size && !current.is_empty() {
                out.push(current.concat());

                // Drop leading pieces until what remains fits in the overlap
                while current_len > self.overlap
                    || (current_len + piece_len > self.chunk_size && current_len > 0)
                {
                    let removed = current.remove(0);
                    current_len -= removed.chars().count();
                }
            }

            current_len += piece_len;
            current.push(piece);
        }

        if !current.is_empty() {
            out.push(current.concat());
        }
    }

    /// Character-boundary split with overlap, for text with no separators left
    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

/// First separator that actually occurs in the text; "" always matches
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on a separator, keeping the separator attached to the preceding piece
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(separator) {
        let end = pos + separator.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}
