//! bankparse-gemini: completion client, prompt assembly, and the pipeline
//! tying extraction, the model call, and normalization together.

pub mod client;
pub mod pipeline;
pub mod prompt;

pub use client::{CompletionClient, GeminiClient, GeminiConfig, MockClient};
pub use pipeline::{ParsedStatement, StatementParser};
pub use prompt::build_prompt;
