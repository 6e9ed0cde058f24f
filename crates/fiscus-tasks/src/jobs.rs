//! Concrete job handlers.
//!
//! One job type exists today: `index_entry`, which drives the embedding
//! indexer. Duplicate delivery is safe because the indexer upserts by entry
//! ID; a lost job merely leaves the entry stale until its next mutation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fiscus_core::{EntryId, OwnerId};
use fiscus_embeddings::EmbeddingIndexer;

use crate::errors::{Result, TaskError};
use crate::worker::JobHandler;

/// Job type key for entry (re)indexing.
pub const INDEX_ENTRY_JOB: &str = "index_entry";

/// Arguments for [`IndexEntryJob`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntryArgs {
    /// Entry to (re)index.
    pub entry_id: EntryId,
    /// Owner the entry must belong to.
    pub owner_id: OwnerId,
}

/// Build the args value for an `index_entry` job.
pub fn index_entry_args(entry_id: &EntryId, owner_id: &OwnerId) -> serde_json::Value {
    serde_json::json!({
        "entryId": entry_id,
        "ownerId": owner_id,
    })
}

/// Handler that reindexes one ledger entry.
pub struct IndexEntryJob {
    indexer: Arc<EmbeddingIndexer>,
}

impl IndexEntryJob {
    /// Create the handler.
    #[must_use]
    pub fn new(indexer: Arc<EmbeddingIndexer>) -> Self {
        Self { indexer }
    }
}

#[async_trait]
impl JobHandler for IndexEntryJob {
    async fn run(&self, args: &serde_json::Value) -> Result<()> {
        let args: IndexEntryArgs = serde_json::from_value(args.clone())?;
        self.indexer
            .reindex(&args.entry_id, &args.owner_id)
            .await
            .map_err(|e| TaskError::Handler(e.to_string()))
    }
}
