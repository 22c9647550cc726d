//! Property tests for the sliding-window chunker.

use docqa::chunking::TextChunker;
use docqa::document::{Document, Page};
use proptest::prelude::*;

/// Chunk size with a strictly smaller overlap.
fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..50).prop_flat_map(|size| (Just(size), 0usize..size))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every chunk carries exactly the characters of the document at its
    /// offset, no chunk exceeds the configured size, and together the
    /// chunks cover the whole text.
    #[test]
    fn chunks_cover_the_document_exactly(
        text in "[a-zµλ ]{0,200}",
        (size, overlap) in arb_params(),
    ) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let document = Document::from_text("test.txt", text.clone());
        let chunks = chunker.chunk(&document);

        let total_chars = text.chars().count();
        if total_chars == 0 {
            prop_assert!(chunks.is_empty());
            return Ok(());
        }

        let step = size - overlap;
        let mut covered = 0usize;
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.offset, i * step);

            let chunk_chars = chunk.text.chars().count();
            prop_assert!(chunk_chars > 0);
            prop_assert!(chunk_chars <= size);

            let expected: String =
                text.chars().skip(chunk.offset).take(chunk_chars).collect();
            prop_assert_eq!(&chunk.text, &expected);

            // Each chunk must extend coverage past its predecessor.
            let end = chunk.offset + chunk_chars;
            prop_assert!(end > covered);
            covered = end;
        }
        prop_assert_eq!(covered, total_chars);
    }

    /// Consecutive chunks share exactly `chunk_overlap` characters.
    #[test]
    fn consecutive_chunks_share_exactly_the_overlap(
        text in "[a-z]{30,120}",
        (size, overlap) in (5usize..20).prop_flat_map(|s| (Just(s), 1usize..s)),
    ) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let document = Document::from_text("test.txt", text);
        let chunks = chunker.chunk(&document);

        for window in chunks.windows(2) {
            let prev: Vec<char> = window[0].text.chars().collect();
            let next: Vec<char> = window[1].text.chars().collect();

            // Only the final chunk may be short.
            prop_assert_eq!(prev.len(), size);

            let suffix: String = prev[prev.len() - overlap..].iter().collect();
            let prefix: String = next[..overlap].iter().collect();
            prop_assert_eq!(suffix, prefix);
        }
    }
}

#[test]
fn three_page_document_splits_along_its_pages() {
    // 2500 characters across three pages, chunked at 1000 with no overlap:
    // the chunks line up with the pages exactly.
    let document = Document {
        source: "report.pdf".to_string(),
        pages: vec![
            Page { index: 0, text: "a".repeat(1000) },
            Page { index: 1, text: "b".repeat(1000) },
            Page { index: 2, text: "c".repeat(500) },
        ],
    };
    let chunker = TextChunker::new(1000, 0).unwrap();
    let chunks = chunker.chunk(&document);

    assert_eq!(chunks.len(), 3);

    assert_eq!(chunks[0].text, "a".repeat(1000));
    assert_eq!(chunks[0].page, 0);
    assert_eq!(chunks[0].offset, 0);

    assert_eq!(chunks[1].text, "b".repeat(1000));
    assert_eq!(chunks[1].page, 1);
    assert_eq!(chunks[1].offset, 1000);

    assert_eq!(chunks[2].text, "c".repeat(500));
    assert_eq!(chunks[2].page, 2);
    assert_eq!(chunks[2].offset, 2000);
}

#[test]
fn chunks_spanning_pages_belong_to_the_page_of_their_first_character() {
    let document = Document {
        source: "two-pages.pdf".to_string(),
        pages: vec![
            Page { index: 0, text: "aaaa".to_string() },
            Page { index: 1, text: "bbbb".to_string() },
        ],
    };
    let chunker = TextChunker::new(6, 0).unwrap();
    let chunks = chunker.chunk(&document);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "aaaabb");
    assert_eq!(chunks[0].page, 0);
    assert_eq!(chunks[1].text, "bb");
    assert_eq!(chunks[1].page, 1);
    assert_eq!(chunks[1].offset, 6);
}

#[test]
fn document_shorter_than_the_window_yields_one_chunk() {
    let document = Document::from_text("note.txt", "short note");
    let chunker = TextChunker::new(1000, 0).unwrap();
    let chunks = chunker.chunk(&document);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "short note");
    assert_eq!(chunks[0].offset, 0);
}
