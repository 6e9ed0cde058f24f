//! Task queue error types.

use thiserror::Error;

/// Errors from queue operations and job handlers.
#[derive(Debug, Error)]
pub enum TaskError {
    /// `SQLite` error (preserves source chain).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(String),

    /// Job arguments could not be (de)serialized.
    #[error("args error: {0}")]
    Args(#[from] serde_json::Error),

    /// A job handler failed; the job is requeued.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl From<r2d2::Error> for TaskError {
    fn from(e: r2d2::Error) -> Self {
        Self::Pool(e.to_string())
    }
}

/// Result alias for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_variants() {
        assert_eq!(
            TaskError::Handler("embed failed".into()).to_string(),
            "handler failed: embed failed"
        );
        assert_eq!(
            TaskError::Pool("exhausted".into()).to_string(),
            "pool error: exhausted"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TaskError>();
    }
}
