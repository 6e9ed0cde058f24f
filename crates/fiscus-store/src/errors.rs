//! Store error types.

use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` error (preserves source chain).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(String),

    /// Schema migration failed.
    #[error("migration failed: {message}")]
    Migration {
        /// Error description.
        message: String,
    },

    /// Stored data could not be interpreted.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        Self::Pool(e.to_string())
    }
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn sqlite_error_preserves_source() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("SQLite error"));
    }

    #[test]
    fn migration_display() {
        let err = StoreError::Migration {
            message: "v1 failed".into(),
        };
        assert_eq!(err.to_string(), "migration failed: v1 failed");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StoreError>();
    }
}
