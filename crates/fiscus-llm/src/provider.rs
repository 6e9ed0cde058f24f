//! Generation provider trait.
//!
//! Core abstraction for the assistant's text generation backend. The trait
//! returns a boxed stream of text fragments so the session controller can
//! relay tokens incrementally regardless of the underlying API format.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{LlmError, Result, TokenStream};

/// A text generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stream a generated response as incremental text fragments.
    ///
    /// The stream may terminate early with an `Err` item on transport
    /// failure; fragments already yielded remain valid.
    async fn generate_stream(&self, prompt: &str, system: Option<&str>) -> Result<TokenStream>;

    /// Generate a single JSON value (non-streaming, JSON output mode).
    ///
    /// Used for structured extraction. Callers must treat any error or
    /// non-conforming value as an extraction miss, never as a user-visible
    /// failure.
    async fn generate_json(&self, prompt: &str, system: Option<&str>) -> Result<serde_json::Value>;
}

/// Scripted provider for tests.
///
/// Streams a fixed token sequence (optionally failing mid-stream) and
/// returns a fixed JSON value. Records the prompts it was called with.
pub struct MockGenerationProvider {
    tokens: Vec<String>,
    fail_after: Option<usize>,
    json: std::result::Result<serde_json::Value, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerationProvider {
    /// Provider that streams the given tokens and answers JSON with `null`.
    #[must_use]
    pub fn streaming(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(ToString::to_string).collect(),
            fail_after: None,
            json: Ok(serde_json::Value::Null),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Provider that fails the stream after yielding `n` tokens.
    #[must_use]
    pub fn failing_after(tokens: &[&str], n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::streaming(tokens)
        }
    }

    /// Provider that answers JSON-mode calls with the given value.
    #[must_use]
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            json: Ok(value),
            ..Self::streaming(&[])
        }
    }

    /// Provider whose JSON-mode calls fail.
    #[must_use]
    pub fn json_error(message: &str) -> Self {
        Self {
            json: Err(message.to_string()),
            ..Self::streaming(&[])
        }
    }

    /// Set the streamed tokens on any mock.
    #[must_use]
    pub fn with_tokens(mut self, tokens: &[&str]) -> Self {
        self.tokens = tokens.iter().map(ToString::to_string).collect();
        self
    }

    /// Prompts passed to either generation method, in call order.
    pub fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate_stream(&self, prompt: &str, _system: Option<&str>) -> Result<TokenStream> {
        self.prompts.lock().push(prompt.to_string());
        let tokens = self.tokens.clone();
        let fail_after = self.fail_after;

        let items: Vec<Result<String>> = tokens
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                if fail_after.is_some_and(|n| i >= n) {
                    Err(LlmError::Stream {
                        message: "connection reset".into(),
                    })
                } else {
                    Ok(t)
                }
            })
            .collect();

        // Only yield a single error item, then end.
        let mut out = Vec::new();
        for item in items {
            let is_err = item.is_err();
            out.push(item);
            if is_err {
                break;
            }
        }
        Ok(Box::pin(futures::stream::iter(out)))
    }

    async fn generate_json(&self, prompt: &str, _system: Option<&str>) -> Result<serde_json::Value> {
        self.prompts.lock().push(prompt.to_string());
        match &self.json {
            Ok(value) => Ok(value.clone()),
            Err(message) => Err(LlmError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}
