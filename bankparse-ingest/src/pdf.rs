//! PDF-to-text extraction.
//!
//! Any extraction failure maps to `InputNotFound`: from the pipeline's point
//! of view an unreadable statement and a missing one are the same input
//! error.

use std::path::Path;

use bankparse_core::ParseError;

/// Plain text pulled out of one statement document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub text: String,
    /// Used downstream only as a sanity bound, never for pagination logic.
    pub page_count: usize,
}

/// Extract text from a statement PDF on disk.
pub fn extract_document(path: &Path) -> Result<ExtractedDocument, ParseError> {
    if !path.is_file() {
        return Err(ParseError::InputNotFound {
            path: path.display().to_string(),
            detail: "no such file".to_string(),
        });
    }

    let text = pdf_extract::extract_text(path).map_err(|e| ParseError::InputNotFound {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    Ok(document_from_text(text))
}

/// Extract text from an in-memory statement PDF.
pub fn extract_document_bytes(bytes: &[u8]) -> Result<ExtractedDocument, ParseError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| ParseError::InputNotFound {
        path: "<in-memory document>".to_string(),
        detail: e.to_string(),
    })?;

    Ok(document_from_text(text))
}

fn document_from_text(text: String) -> ExtractedDocument {
    // Extractors separate pages with form feeds; a single-page document may
    // carry none, so floor at one.
    let page_count = text
        .split('\u{c}')
        .filter(|page| !page.trim().is_empty())
        .count()
        .max(1);

    tracing::debug!(page_count, bytes = text.len(), "extracted statement text");

    ExtractedDocument { text, page_count }
}
