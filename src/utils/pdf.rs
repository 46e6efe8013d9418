//! PDF text extraction utilities.
//!
//! Only the first page is needed to identify a paper: it carries the title,
//! the author names and usually the journal header. Text is read with lopdf;
//! when that yields nothing (unusual encodings, broken xref tables) the whole
//! document is run through pdf-extract and cut down to the same budget.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("File not found or not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("No extractable text in PDF: {0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract the text of the first page, at most `max_chars` characters.
pub fn extract_first_page(path: &Path, max_chars: usize) -> Result<String, PdfExtractError> {
    if !path.is_file() {
        return Err(PdfExtractError::InvalidFile(format!(
            "Not a file: {}",
            path.display()
        )));
    }

    let raw = match first_page_lopdf(path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::debug!("lopdf found no text on page 1 of {}, trying pdf-extract", path.display());
            whole_document(path)?
        }
        Err(e) => {
            tracing::debug!("lopdf failed on {}: {}, trying pdf-extract", path.display(), e);
            whole_document(path)?
        }
    };

    let text = truncate_chars(&normalize_whitespace(&raw), max_chars);
    if text.is_empty() {
        // Scanned or image-only PDF
        return Err(PdfExtractError::Empty(path.display().to_string()));
    }
    Ok(text)
}

fn first_page_lopdf(path: &Path) -> Result<String, PdfExtractError> {
    let document = lopdf::Document::load(path)
        .map_err(|e| PdfExtractError::InvalidFile(format!("{}: {}", path.display(), e)))?;

    let first = document
        .get_pages()
        .keys()
        .next()
        .copied()
        .ok_or_else(|| PdfExtractError::InvalidFile(format!("{} has no pages", path.display())))?;

    document
        .extract_text(&[first])
        .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))
}

fn whole_document(path: &Path) -> Result<String, PdfExtractError> {
    pdf_extract::extract_text(path).map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))
}

/// Collapse runs of spaces/tabs and blank lines
fn normalize_whitespace(text: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t\u{3000}]+").expect("valid regex"));
    let blank_lines = BLANK_LINES.get_or_init(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

    let text = spaces.replace_all(text, " ");
    blank_lines.replace_all(&text, "\n").trim().to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_nonexistent_file() {
        let result = extract_first_page(Path::new("/nonexistent/file.pdf"), 100);
        assert!(matches!(result, Err(PdfExtractError::InvalidFile(_))));
    }

    #[test]
    fn test_extract_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        assert!(extract_first_page(&path, 100).is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        let text = "  タイトル\u{3000}\u{3000}副題 \n\n\n 田中\t 太郎  ";
        assert_eq!(normalize_whitespace(text), "タイトル 副題 \n 田中 太郎");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("研究論文", 2), "研究");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
