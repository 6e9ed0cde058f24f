//! Embedding error types.
//!
//! Provider failures never escape the indexer boundary — the indexer degrades
//! to a sentinel vector instead. The variants here surface storage problems
//! and misconfiguration.

use thiserror::Error;

/// Errors from embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedding provider call failed.
    #[error("provider error: {0}")]
    Provider(String),

    /// `SQLite` error (preserves source chain).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Vector storage operation failed (non-SQLite).
    #[error("storage failed: {0}")]
    Storage(String),

    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(String),
}

impl From<fiscus_store::StoreError> for EmbeddingError {
    fn from(e: fiscus_store::StoreError) -> Self {
        match e {
            fiscus_store::StoreError::Sqlite(inner) => Self::Sqlite(inner),
            fiscus_store::StoreError::Pool(msg) => Self::Pool(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Result alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;
