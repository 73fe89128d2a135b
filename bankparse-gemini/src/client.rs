//! Completion client: the Gemini HTTP implementation and a queue-backed
//! mock for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use bankparse_core::ParseError;

/// Anything that can turn a prompt into completion text. One attempt per
/// call; retry policy belongs to the caller.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ParseError>;
}

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Resolve the credential once, at construction: explicit key first,
    /// then the GEMINI_API_KEY environment variable. Call sites never touch
    /// the environment again.
    pub fn resolve(explicit_key: Option<String>) -> Result<Self, ParseError> {
        let api_key = match explicit_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or(ParseError::MissingCredential)?,
        };

        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ParseError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ParseError::UpstreamUnavailable {
                detail: format!("building http client: {e}"),
            })?;

        Ok(Self { config, http })
    }

    async fn complete_async(&self, prompt: &str) -> Result<String, ParseError> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            parts: Option<Vec<CandidatePart>>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            text: Option<String>,
        }

        let url = format!("{API_BASE}/models/{}:generateContent", self.config.model);
        let body = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ParseError::UpstreamUnavailable {
                detail: format!("{status} {detail}"),
            });
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| ParseError::UpstreamUnavailable {
                detail: format!("undecodable response body: {e}"),
            })?;

        let mut text = String::new();
        for candidate in out.candidates.unwrap_or_default() {
            for part in candidate.content.parts.unwrap_or_default() {
                if let Some(t) = part.text {
                    text.push_str(&t);
                }
            }
        }

        Ok(text.trim().to_string())
    }
}

fn classify_transport_error(e: reqwest::Error) -> ParseError {
    if e.is_timeout() {
        ParseError::UpstreamTimeout
    } else {
        ParseError::UpstreamUnavailable {
            detail: e.to_string(),
        }
    }
}

impl CompletionClient for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String, ParseError> {
        // Callers may already sit inside a tokio runtime (the CLI does);
        // block_on there would panic, so bridge through block_in_place.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(prompt)))
        } else {
            let rt =
                tokio::runtime::Runtime::new().map_err(|e| ParseError::UpstreamUnavailable {
                    detail: format!("creating tokio runtime: {e}"),
                })?;
            rt.block_on(self.complete_async(prompt))
        }
    }
}

/// Queue-backed stand-in: each `complete` call pops the next canned result.
#[derive(Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<Result<String, ParseError>>>,
}

impl MockClient {
    pub fn push_completion(&self, text: impl Into<String>) {
        self.queue().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, err: ParseError) {
        self.queue().push_back(Err(err));
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, ParseError>>> {
        match self.responses.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CompletionClient for MockClient {
    fn complete(&self, _prompt: &str) -> Result<String, ParseError> {
        self.queue()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ParseError::UpstreamUnavailable {
                    detail: "mock queue empty".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_explicit_key() {
        let config = GeminiConfig::resolve(Some("abc123".to_string())).unwrap();
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_config_builders() {
        let config = GeminiConfig::resolve(Some("k".to_string()))
            .unwrap()
            .with_model("gemini-1.5-pro")
            .with_timeout(Duration::from_secs(10));
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_mock_pops_in_order() {
        let mock = MockClient::default();
        mock.push_completion("first");
        mock.push_completion("second");
        assert_eq!(mock.complete("p").unwrap(), "first");
        assert_eq!(mock.complete("p").unwrap(), "second");
        assert!(mock.complete("p").is_err());
    }

    #[test]
    fn test_mock_propagates_errors() {
        let mock = MockClient::default();
        mock.push_error(ParseError::UpstreamTimeout);
        assert!(matches!(
            mock.complete("p"),
            Err(ParseError::UpstreamTimeout)
        ));
    }
}
