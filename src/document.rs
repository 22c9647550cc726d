//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// A single page of a source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Zero-based page index within the source document.
    pub index: usize,
    /// The raw text content of the page.
    pub text: String,
}

/// A loaded source document: an ordered sequence of pages.
///
/// Documents are immutable after loading and are discarded once chunked;
/// only [`Chunk`]s flow into the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Where the document came from (a file path in practice).
    pub source: String,
    /// The ordered pages of the document.
    pub pages: Vec<Page>,
}

impl Document {
    /// Build a single-page document from raw text.
    pub fn from_text(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source: source.into(), pages: vec![Page { index: 0, text: text.into() }] }
    }

    /// The full document text: all pages concatenated in order.
    ///
    /// No separator is inserted between pages, so character offsets into
    /// the returned string line up with [`Chunk::offset`].
    pub fn text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect()
    }
}

/// A bounded span of document text prepared for embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// Index of the page containing the chunk's first character.
    pub page: usize,
    /// Character offset of the chunk within the concatenated document text.
    pub offset: usize,
}

/// A retrieved [`Chunk`] paired with its store id and similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The store-assigned identifier of the entry.
    pub id: String,
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A generated answer together with the retrieved chunks it was based on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer text, verbatim from the model.
    pub text: String,
    /// The retrieved chunks passed to the model as context, in ranked order.
    pub sources: Vec<SearchResult>,
}
