//! Embedding provider abstraction.
//!
//! [`EmbeddingService`] is the seam between the indexer and whatever produces
//! vectors. Production uses [`HttpEmbeddingService`] against an
//! Ollama-compatible `/api/embeddings` endpoint; tests use
//! [`MockEmbeddingService`], a deterministic hash-based embedder.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{EmbeddingError, Result};
use crate::normalize::l2_normalize;

/// Produces fixed-dimension embedding vectors from text.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a single text into a vector of [`Self::dimensions`] floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimensionality of this service.
    fn dimensions(&self) -> usize;
}

/// Configuration for [`HttpEmbeddingService`].
#[derive(Clone, Debug)]
pub struct HttpEmbeddingConfig {
    /// Base URL of the Ollama-compatible API.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Expected vector dimensions.
    pub dimensions: usize,
    /// Request timeout.
    pub timeout: Duration,
}

/// HTTP embedding client for an Ollama-compatible `/api/embeddings` endpoint.
pub struct HttpEmbeddingService {
    config: HttpEmbeddingConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

impl HttpEmbeddingService {
    /// Create a new client.
    #[must_use]
    pub fn new(config: HttpEmbeddingConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: HttpEmbeddingConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Provider(format!(
                "embedding API returned {status}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

        if parsed.embedding.len() != self.config.dimensions {
            return Err(EmbeddingError::Provider(format!(
                "dimension mismatch: expected {}, got {}",
                self.config.dimensions,
                parsed.embedding.len()
            )));
        }

        debug!(len = parsed.embedding.len(), "embedded text");
        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

/// Deterministic embedding service for tests.
///
/// Hashes character trigrams into dimension buckets and L2-normalizes, so
/// equal texts embed equally and similar texts land near each other.
pub struct MockEmbeddingService {
    dimensions: usize,
}

impl MockEmbeddingService {
    /// Create a mock with the given output dimensions.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    #[allow(clippy::cast_precision_loss)]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0_f32; self.dimensions];
        let bytes = text.as_bytes();
        for window in bytes.windows(3) {
            let mut hash: usize = 5381;
            for &b in window {
                hash = hash.wrapping_mul(33).wrapping_add(b as usize);
            }
            v[hash % self.dimensions] += 1.0;
        }
        l2_normalize(&mut v);
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
