//! Auto-creator — expands a creation intent into persisted entries.
//!
//! N installments become N entries on consecutive calendar months (day
//! clamped to month length), persisted as one atomic batch. Groups of more
//! than one share a fresh group ID, carry "(i/N)" ordinals, and only the
//! final sibling's note marks the last installment. Indexing jobs are
//! enqueued after commit, one per entry.

use tracing::info;

use fiscus_core::dates::{add_months, format_date_br};
use fiscus_core::{EntryKind, GroupId, OwnerId};
use fiscus_store::types::{LedgerEntry, NewEntry};
use fiscus_store::{CategoryRepository, ConnectionPool, LedgerRepository};
use fiscus_tasks::{index_entry_args, TaskQueue, INDEX_ENTRY_JOB};

use crate::errors::Result;
use crate::types::CreationIntent;

/// Note placed on the final installment of a group.
const FINAL_INSTALLMENT_NOTE: &str = "Última parcela";

/// Result of an auto-creation.
pub struct CreationOutcome {
    /// The persisted entries, in installment order.
    pub entries: Vec<LedgerEntry>,
    /// pt-BR confirmation for the client.
    pub confirmation: String,
}

/// Expands creation intents into ledger entries.
pub struct AutoCreator {
    pool: ConnectionPool,
    queue: TaskQueue,
}

impl AutoCreator {
    /// Create an auto-creator over the shared pool and job queue.
    #[must_use]
    pub fn new(pool: ConnectionPool, queue: TaskQueue) -> Self {
        Self { pool, queue }
    }

    /// Persist the intent's entries and schedule their indexing.
    pub fn create(&self, owner: &OwnerId, intent: &CreationIntent) -> Result<CreationOutcome> {
        let mut conn = self.pool.get()?;

        let category = CategoryRepository::resolve_for_kind(&conn, intent.kind, owner)?;
        let new_entries = expand_installments(owner, intent, &category.id);
        let entries = LedgerRepository::create_batch(&mut conn, &new_entries)?;
        drop(conn);

        // After commit: one indexing request per entry. Enqueue failures are
        // tolerable — the entry stays unindexed until its next mutation.
        for entry in &entries {
            if let Err(e) = self
                .queue
                .enqueue(INDEX_ENTRY_JOB, &index_entry_args(&entry.id, owner))
            {
                tracing::warn!(entry_id = %entry.id, error = %e, "failed to schedule indexing");
            }
        }

        info!(
            owner = %owner,
            count = entries.len(),
            kind = intent.kind.as_sql(),
            "auto-created ledger entries"
        );

        Ok(CreationOutcome {
            confirmation: confirmation_text(intent),
            entries,
        })
    }
}

/// Build the N [`NewEntry`] rows for an intent.
fn expand_installments(
    owner: &OwnerId,
    intent: &CreationIntent,
    category_id: &fiscus_core::CategoryId,
) -> Vec<NewEntry> {
    let count = intent.installment_count.max(1);
    let group_id = (count > 1).then(GroupId::new);

    (1..=count)
        .map(|ordinal| {
            let description = if count > 1 {
                format!("{} ({ordinal}/{count})", intent.name)
            } else {
                intent.name.clone()
            };
            let note = (count > 1 && ordinal == count)
                .then(|| FINAL_INSTALLMENT_NOTE.to_string());
            NewEntry {
                owner_id: owner.clone(),
                category_id: category_id.clone(),
                kind: intent.kind,
                description,
                amount: intent.amount,
                due_date: add_months(intent.start_date, ordinal - 1),
                payment_date: None,
                paid: false,
                note,
                installment_group_id: group_id.clone(),
            }
        })
        .collect()
}

/// pt-BR confirmation naming description, amount, kind, count, start date.
fn confirmation_text(intent: &CreationIntent) -> String {
    let kind = match intent.kind {
        EntryKind::Income => "receita",
        EntryKind::Expense => "despesa",
    };
    let start = format_date_br(intent.start_date);
    if intent.installment_count > 1 {
        format!(
            "Lançamento criado: '{}' ({kind}) em {}x de {} a partir de {start}.",
            intent.name,
            intent.installment_count,
            intent.amount.format_brl(),
        )
    } else {
        format!(
            "Lançamento criado: '{}' ({kind}) de {} com vencimento em {start}.",
            intent.name,
            intent.amount.format_brl(),
        )
    }
}
