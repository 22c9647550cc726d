//! Document loading.
//!
//! Reads a source file into an ordered sequence of [`Page`]s. PDF files are
//! extracted page by page; plain text and Markdown load as a single page.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::document::{Document, Page};
use crate::error::{RagError, Result};

/// Maximum file size (50 MB) accepted by the loader.
const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

fn load_err(path: &Path, message: impl Into<String>) -> RagError {
    RagError::LoadError { path: path.to_path_buf(), message: message.into() }
}

/// Load a source document from `path`.
///
/// Supported formats: `.pdf` (one [`Page`] per PDF page, empty pages kept so
/// indices stay aligned with the source), `.txt` / `.md` / `.markdown`
/// (single page). Everything else fails with [`RagError::LoadError`], as do
/// unreadable files and files over 50 MB.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();

    let metadata =
        fs::metadata(path).map_err(|e| load_err(path, format!("cannot read file: {e}")))?;
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(load_err(
            path,
            format!("file is {} bytes (max {MAX_DOCUMENT_BYTES})", metadata.len()),
        ));
    }

    let extension =
        path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default();

    let pages = match extension.as_str() {
        "pdf" => pdf_extract::extract_text_by_pages(path)
            .map_err(|e| load_err(path, format!("PDF extraction failed: {e}")))?,
        "txt" | "md" | "markdown" => {
            vec![
                fs::read_to_string(path)
                    .map_err(|e| load_err(path, format!("cannot read file: {e}")))?,
            ]
        }
        "" => return Err(load_err(path, "file has no extension")),
        other => return Err(load_err(path, format!("unsupported file type: .{other}"))),
    };

    let document = Document {
        source: path.to_string_lossy().into_owned(),
        pages: pages
            .into_iter()
            .enumerate()
            .map(|(index, text)| Page { index, text })
            .collect(),
    };

    debug!(
        source = %document.source,
        page_count = document.pages.len(),
        "loaded document"
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_text_file_as_single_page() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "hello from a text file").unwrap();

        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].index, 0);
        assert_eq!(doc.pages[0].text, "hello from a text file");
    }

    #[test]
    fn rejects_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, RagError::LoadError { .. }));
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn rejects_missing_file() {
        let err = load_document("/nonexistent/input.pdf").unwrap_err();
        assert!(matches!(err, RagError::LoadError { .. }));
    }

    #[test]
    fn rejects_extensionless_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, RagError::LoadError { .. }));
    }
}
