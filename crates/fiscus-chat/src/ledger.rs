//! Ledger mutation service.
//!
//! Wraps the store's entry mutations with the indexing lifecycle: every
//! create and update schedules exactly one `index_entry` job per affected
//! row, after the write commits. Deletes schedule nothing — the embedding
//! row dies with its entry inside the same transaction.

use tracing::warn;

use fiscus_core::{EntryId, GroupId, OwnerId};
use fiscus_store::types::{EntryChanges, GroupChanges, LedgerEntry, NewEntry};
use fiscus_store::{ConnectionPool, LedgerRepository};
use fiscus_tasks::{index_entry_args, TaskQueue, INDEX_ENTRY_JOB};

use crate::errors::Result;

/// Owner-scoped entry mutations with reindex scheduling.
pub struct LedgerService {
    pool: ConnectionPool,
    queue: TaskQueue,
}

impl LedgerService {
    /// Create a service over the shared pool and job queue.
    #[must_use]
    pub fn new(pool: ConnectionPool, queue: TaskQueue) -> Self {
        Self { pool, queue }
    }

    /// Create an entry and schedule its indexing.
    pub fn create(&self, entry: &NewEntry) -> Result<LedgerEntry> {
        let created = {
            let conn = self.pool.get()?;
            LedgerRepository::create(&conn, entry)?
        };
        self.schedule_reindex(&created.id, &created.owner_id);
        Ok(created)
    }

    /// Update an entry and schedule one reindex. Foreign rows read as absent.
    pub fn update(
        &self,
        id: &EntryId,
        owner: &OwnerId,
        changes: &EntryChanges,
    ) -> Result<Option<LedgerEntry>> {
        let updated = {
            let conn = self.pool.get()?;
            LedgerRepository::update(&conn, id, owner, changes)?
        };
        if updated.is_some() {
            self.schedule_reindex(id, owner);
        }
        Ok(updated)
    }

    /// Delete an entry. The embedding row cascades; nothing to reindex.
    pub fn delete(&self, id: &EntryId, owner: &OwnerId) -> Result<bool> {
        let conn = self.pool.get()?;
        Ok(LedgerRepository::delete(&conn, id, owner)?)
    }

    /// Apply changes to every sibling of a group atomically, then schedule
    /// one reindex per sibling.
    pub fn update_group(
        &self,
        group: &GroupId,
        owner: &OwnerId,
        changes: &GroupChanges,
    ) -> Result<Vec<EntryId>> {
        let affected = {
            let mut conn = self.pool.get()?;
            LedgerRepository::update_group(&mut conn, group, owner, changes)?
        };
        for id in &affected {
            self.schedule_reindex(id, owner);
        }
        Ok(affected)
    }

    /// Delete every sibling of a group atomically. Embeddings cascade.
    pub fn delete_group(&self, group: &GroupId, owner: &OwnerId) -> Result<Vec<EntryId>> {
        let mut conn = self.pool.get()?;
        Ok(LedgerRepository::delete_group(&mut conn, group, owner)?)
    }

    fn schedule_reindex(&self, id: &EntryId, owner: &OwnerId) {
        // Enqueue failures are tolerable: the entry stays stale until its
        // next mutation triggers another reindex.
        if let Err(e) = self.queue.enqueue(INDEX_ENTRY_JOB, &index_entry_args(id, owner)) {
            warn!(entry_id = %id, error = %e, "failed to schedule indexing");
        }
    }
}
