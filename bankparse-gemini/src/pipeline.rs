//! End-to-end statement parsing: extract, prompt, complete, normalize.
//!
//! One invocation is one isolated linear pass; nothing is shared across
//! calls, so callers wanting parallelism run independent parsers.

use std::path::Path;

use bankparse_core::{ParseError, Summary, Transaction, normalize_completion};
use bankparse_ingest::{ExtractedDocument, extract_document, extract_document_bytes};

use crate::client::CompletionClient;
use crate::prompt::build_prompt;

/// One parsed statement: surviving records plus observability counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub transactions: Vec<Transaction>,
    /// Candidates the normalizer dropped. Nonzero is partial success, not
    /// failure.
    pub rejected: usize,
    pub page_count: usize,
}

impl ParsedStatement {
    pub fn summary(&self) -> Summary {
        Summary::of(&self.transactions)
    }
}

pub struct StatementParser<C> {
    client: C,
}

impl<C: CompletionClient> StatementParser<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Parse a statement PDF on disk.
    pub fn parse_path(&self, path: &Path) -> Result<ParsedStatement, ParseError> {
        let doc = extract_document(path)?;
        self.parse_document(&doc)
    }

    /// Parse an in-memory statement PDF.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedStatement, ParseError> {
        let doc = extract_document_bytes(bytes)?;
        self.parse_document(&doc)
    }

    /// Parse already-extracted text. The seam the tests use.
    pub fn parse_document(&self, doc: &ExtractedDocument) -> Result<ParsedStatement, ParseError> {
        let prompt = build_prompt(doc);
        tracing::debug!(
            prompt_chars = prompt.len(),
            pages = doc.page_count,
            "requesting completion"
        );

        let completion = self.client.complete(&prompt)?;
        let batch = normalize_completion(&completion, doc.page_count)?;

        tracing::info!(
            kept = batch.transactions.len(),
            rejected = batch.rejected,
            "normalized completion"
        );

        Ok(ParsedStatement {
            transactions: batch.transactions,
            rejected: batch.rejected,
            page_count: doc.page_count,
        })
    }
}
