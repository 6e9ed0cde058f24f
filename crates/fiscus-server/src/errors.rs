//! Server error types.

use thiserror::Error;

/// Errors from server startup and shutdown.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence failed during startup.
    #[error(transparent)]
    Store(#[from] fiscus_store::StoreError),
}

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
