//! Embedding indexer — the out-of-band `reindex` operation.
//!
//! Runs from the job queue, never from the request path. Loads the entry
//! scoped to its claimed owner (a missing or foreign entry is a silent
//! no-op), renders the canonical text, embeds it, and upserts the single
//! embedding row for the entry.
//!
//! Provider failures never escape this boundary: the write is kept with an
//! all-zeros sentinel vector so a later reindex can repair it.

use std::sync::Arc;

use tracing::{debug, warn};

use fiscus_core::{EntryId, OwnerId};
use fiscus_store::{ConnectionPool, LedgerRepository};

use crate::errors::{EmbeddingError, Result};
use crate::service::EmbeddingService;
use crate::text::render_entry_text;
use crate::vector_repo::VectorRepository;

/// Indexes ledger entries into the vector store.
pub struct EmbeddingIndexer {
    pool: ConnectionPool,
    service: Arc<dyn EmbeddingService>,
}

impl EmbeddingIndexer {
    /// Create a new indexer.
    pub fn new(pool: ConnectionPool, service: Arc<dyn EmbeddingService>) -> Self {
        Self { pool, service }
    }

    /// (Re)index one entry.
    ///
    /// Idempotent: re-running against unchanged entry state stores an
    /// equivalent record. Returns `Ok` when the entry does not exist or is
    /// not owned by `owner` — authorization failures read as not-found.
    pub async fn reindex(&self, entry_id: &EntryId, owner: &OwnerId) -> Result<()> {
        let entry = {
            let conn = self.pool.get().map_err(|e| EmbeddingError::Pool(e.to_string()))?;
            LedgerRepository::get(&conn, entry_id, owner)?
        };
        let Some(entry) = entry else {
            debug!(entry_id = %entry_id, "entry absent or foreign, skipping reindex");
            return Ok(());
        };

        let content = render_entry_text(&entry);
        let vector = match self.service.embed(&content).await {
            Ok(vector) => vector,
            Err(e) => {
                // Keep the write; a later reindex repairs the sentinel.
                warn!(entry_id = %entry_id, error = %e, "embedding provider failed, storing sentinel");
                vec![0.0; self.service.dimensions()]
            }
        };

        let conn = self.pool.get().map_err(|e| EmbeddingError::Pool(e.to_string()))?;
        VectorRepository::upsert(&conn, owner, entry_id, &content, &vector, None)?;
        debug!(entry_id = %entry_id, "reindexed entry");
        Ok(())
    }
}
