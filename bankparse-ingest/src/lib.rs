//! bankparse-ingest: PDF text extraction for the statement pipeline.
//!
//! Thin wrapper over an external extractor; no layout analysis, no OCR.

pub mod pdf;

pub use pdf::{ExtractedDocument, extract_document, extract_document_bytes};
