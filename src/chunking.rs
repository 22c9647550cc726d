//! Document chunking.
//!
//! [`TextChunker`] splits a [`Document`] into fixed-size chunks by character
//! count with configurable overlap, carrying the source page index and
//! character offset on every chunk.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Splits documents into fixed-size character windows with overlap.
///
/// Page text is concatenated directly (no separator), a window of
/// `chunk_size` characters slides forward by `chunk_size - chunk_overlap`
/// per step, and the final chunk may be shorter. A document shorter than
/// `chunk_size` produces exactly one chunk; an empty document produces none.
///
/// Windowing counts Unicode scalar values, never raw bytes, so multi-byte
/// text cannot be split mid-character.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::TextChunker;
///
/// let chunker = TextChunker::new(1000, 0)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a new `TextChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Split a document into chunks.
    ///
    /// Consecutive chunks share exactly `chunk_overlap` characters except
    /// possibly the final one, and together they cover the document text
    /// with no gaps.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text();
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character, so windows can be sliced without
        // landing inside a multi-byte sequence.
        let char_starts: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
        let total_chars = char_starts.len();

        // Character offset at which each page begins within the
        // concatenated text.
        let mut page_starts = Vec::with_capacity(document.pages.len());
        let mut running = 0;
        for page in &document.pages {
            page_starts.push(running);
            running += page.text.chars().count();
        }

        let byte_at = |char_idx: usize| {
            char_starts.get(char_idx).copied().unwrap_or(text.len())
        };
        let page_at = |char_idx: usize| {
            page_starts.partition_point(|&start| start <= char_idx).saturating_sub(1)
        };

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            chunks.push(Chunk {
                text: text[byte_at(start)..byte_at(end)].to_string(),
                page: page_at(start),
                offset: start,
            });
            if end == total_chars {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;

    fn doc(text: &str) -> Document {
        Document::from_text("test", text)
    }

    #[test]
    fn rejects_overlap_not_less_than_size() {
        assert!(matches!(TextChunker::new(100, 100), Err(RagError::ConfigError(_))));
        assert!(matches!(TextChunker::new(100, 150), Err(RagError::ConfigError(_))));
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(matches!(TextChunker::new(0, 0), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let chunks = chunker.chunk(&doc("tiny"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "tiny");
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let chunker = TextChunker::new(100, 10).unwrap();
        assert!(chunker.chunk(&doc("")).is_empty());
    }

    #[test]
    fn no_degenerate_trailing_chunk() {
        // 10 chars, size 4, overlap 2: windows at 0, 2, 4, 6. The window
        // ending exactly at the text end is the last one emitted.
        let chunker = TextChunker::new(4, 2).unwrap();
        let chunks = chunker.chunk(&doc("0123456789"));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["0123", "2345", "4567", "6789"]);
    }

    #[test]
    fn offsets_advance_by_step() {
        let chunker = TextChunker::new(5, 2).unwrap();
        let chunks = chunker.chunk(&doc("abcdefghij"));
        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let chunker = TextChunker::new(3, 1).unwrap();
        let chunks = chunker.chunk(&doc("héllø wörld"));
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 3);
        }
        // Reassemble from offsets to prove nothing was lost.
        let full: String = doc("héllø wörld").text();
        let last = chunks.last().unwrap();
        assert_eq!(last.offset + last.text.chars().count(), full.chars().count());
    }

    #[test]
    fn chunks_carry_source_page() {
        let document = Document {
            source: "multi".into(),
            pages: vec![
                Page { index: 0, text: "a".repeat(6) },
                Page { index: 1, text: "b".repeat(6) },
            ],
        };
        let chunker = TextChunker::new(4, 0).unwrap();
        let chunks = chunker.chunk(&document);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page, 0); // starts at char 0
        assert_eq!(chunks[1].page, 0); // starts at char 4, page 0 spans 0..6
        assert_eq!(chunks[2].page, 1); // starts at char 8
    }

    #[test]
    fn empty_page_attributes_to_following_page() {
        let document = Document {
            source: "gap".into(),
            pages: vec![
                Page { index: 0, text: "aaa".into() },
                Page { index: 1, text: String::new() },
                Page { index: 2, text: "bbb".into() },
            ],
        };
        let chunker = TextChunker::new(3, 0).unwrap();
        let chunks = chunker.chunk(&document);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].page, 2);
    }
}
