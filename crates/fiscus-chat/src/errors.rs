//! Chat pipeline error types.

use thiserror::Error;

/// Errors from the conversational pipeline.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] fiscus_store::StoreError),

    /// Embedding subsystem failed.
    #[error(transparent)]
    Embedding(#[from] fiscus_embeddings::EmbeddingError),

    /// Generation provider failed.
    #[error(transparent)]
    Llm(#[from] fiscus_llm::LlmError),

    /// Job scheduling failed.
    #[error(transparent)]
    Task(#[from] fiscus_tasks::TaskError),

    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(String),
}

impl From<r2d2::Error> for ChatError {
    fn from(e: r2d2::Error) -> Self {
        Self::Pool(e.to_string())
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_store_errors_transparently() {
        let err: ChatError = fiscus_store::StoreError::Pool("gone".into()).into();
        assert_eq!(err.to_string(), "pool error: gone");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatError>();
    }
}
