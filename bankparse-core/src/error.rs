//! Error taxonomy for one statement-parse invocation.
//!
//! Per-record coercion failures never appear here; they are counted in
//! `NormalizedBatch::rejected` and logged, nothing more.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Source document missing or unreadable. Fatal, no retry.
    #[error("statement not found or unreadable: {path}: {detail}")]
    InputNotFound { path: String, detail: String },

    /// No API key from the caller and none in the environment.
    #[error("no API key available: pass one explicitly or set GEMINI_API_KEY")]
    MissingCredential,

    /// The model request exceeded the configured timeout.
    #[error("model request timed out")]
    UpstreamTimeout,

    /// Transport failure or non-2xx status from the model service.
    #[error("model service unavailable: {detail}")]
    UpstreamUnavailable { detail: String },

    /// The completion held no recognizable structured payload, even after
    /// the one recovery attempt. The raw text rides along for diagnostics.
    #[error("completion contained no recognizable transaction payload")]
    MalformedResponse { raw: String },
}
