//! Semantic retriever — embeds the utterance and searches the owner's index.

use std::sync::Arc;

use tracing::debug;

use fiscus_core::OwnerId;
use fiscus_embeddings::{EmbeddingRecord, EmbeddingService, VectorRepository};
use fiscus_store::ConnectionPool;

use crate::errors::Result;

/// Nearest-neighbor retrieval over one owner's indexed entries.
pub struct SemanticRetriever {
    pool: ConnectionPool,
    embedding: Arc<dyn EmbeddingService>,
}

impl SemanticRetriever {
    /// Create a retriever.
    #[must_use]
    pub fn new(pool: ConnectionPool, embedding: Arc<dyn EmbeddingService>) -> Self {
        Self { pool, embedding }
    }

    /// Retrieve up to `k` records nearest to the utterance, nearest first.
    ///
    /// An empty index yields an empty vec. Embedding the query is a provider
    /// call and can fail — the caller ends the exchange on error.
    pub async fn retrieve(
        &self,
        owner: &OwnerId,
        utterance: &str,
        k: usize,
    ) -> Result<Vec<EmbeddingRecord>> {
        let query = self.embedding.embed(utterance).await?;
        let conn = self.pool.get()?;
        let hits = VectorRepository::search(&conn, owner, &query, k)?;
        debug!(owner = %owner, hits = hits.len(), "retrieved similar entries");
        Ok(hits.into_iter().map(|h| h.record).collect())
    }
}
