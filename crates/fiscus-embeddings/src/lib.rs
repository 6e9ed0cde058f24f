//! # fiscus-embeddings
//!
//! Vector embeddings and semantic search over ledger entries.
//!
//! - Canonical pt-BR text rendering of a ledger entry
//! - [`service::EmbeddingService`] trait with an HTTP (Ollama-style) client
//! - `SQLite` BLOB vector repository with brute-force KNN, strictly scoped to
//!   one owner per search
//! - [`indexer::EmbeddingIndexer`] — the out-of-band `reindex` operation that
//!   keeps one embedding row per entry, degrading to a sentinel vector when
//!   the provider is down

#![deny(unsafe_code)]

pub mod errors;
pub mod indexer;
pub mod normalize;
pub mod service;
pub mod text;
pub mod vector_repo;

pub use errors::{EmbeddingError, Result};
pub use indexer::EmbeddingIndexer;
pub use service::EmbeddingService;
pub use vector_repo::{EmbeddingRecord, SearchHit, VectorRepository};
