//! Ledger entry repository — CRUD, installment-group batch operations, and
//! month aggregates.
//!
//! Installment-group mutations are all-or-nothing: every sibling row changes
//! inside one transaction or none does. Embedding rows cascade from their
//! entry via the schema's `ON DELETE CASCADE`, so deletes resolve the fate of
//! the vector in the same transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};

use fiscus_core::dates::month_bounds;
use fiscus_core::{Amount, EntryId, EntryKind, GroupId, OwnerId};

use crate::errors::{Result, StoreError};
use crate::repositories::{date_from_sql, date_to_sql, now_iso};
use crate::types::{
    CategoryTotal, EntryChanges, GroupChanges, LedgerEntry, MonthMetrics, NewEntry,
};

const ENTRY_COLUMNS: &str = "id, owner_id, category_id, kind, description, amount_cents, \
     due_date, payment_date, paid, note, installment_group_id, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let kind: String = row.get(3)?;
    let due: String = row.get(6)?;
    let payment: Option<String> = row.get(7)?;
    Ok(LedgerEntry {
        id: EntryId::from_string(row.get(0)?),
        owner_id: row.get::<_, String>(1)?.into(),
        category_id: row.get::<_, String>(2)?.into(),
        // CHECK constraint guarantees a valid kind
        kind: EntryKind::from_sql(&kind).unwrap_or(EntryKind::Expense),
        description: row.get(4)?,
        amount: Amount::from_cents(row.get(5)?),
        due_date: date_from_sql(&due),
        payment_date: payment.as_deref().map(date_from_sql),
        paid: row.get(8)?,
        note: row.get(9)?,
        installment_group_id: row.get::<_, Option<String>>(10)?.map(GroupId::from_string),
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Ledger entry repository for SQL CRUD operations.
pub struct LedgerRepository;

impl LedgerRepository {
    /// Create a single entry.
    pub fn create(conn: &Connection, params_in: &NewEntry) -> Result<LedgerEntry> {
        let id = EntryId::new();
        Self::insert(conn, &id, params_in)?;
        Self::get(conn, &id, &params_in.owner_id)?
            .ok_or_else(|| StoreError::InvalidData(format!("entry {id} vanished after insert")))
    }

    /// Create a batch of entries in one transaction.
    ///
    /// Used by installment expansion: either all entries are persisted or
    /// none is.
    pub fn create_batch(conn: &mut Connection, entries: &[NewEntry]) -> Result<Vec<LedgerEntry>> {
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = EntryId::new();
            Self::insert(&tx, &id, entry)?;
            ids.push((id, entry.owner_id.clone()));
        }
        tx.commit()?;

        let mut created = Vec::with_capacity(ids.len());
        for (id, owner) in ids {
            created.push(Self::get(conn, &id, &owner)?.ok_or_else(|| {
                StoreError::InvalidData(format!("entry {id} vanished after batch insert"))
            })?);
        }
        Ok(created)
    }

    /// Get an entry scoped to its owner. Foreign rows read as absent.
    pub fn get(conn: &Connection, id: &EntryId, owner: &OwnerId) -> Result<Option<LedgerEntry>> {
        let entry = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?1 AND owner_id = ?2"),
                params![id.as_str(), owner.as_str()],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// List an owner's entries, most recent due date first.
    pub fn list(conn: &Connection, owner: &OwnerId) -> Result<Vec<LedgerEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE owner_id = ?1 \
             ORDER BY due_date DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![owner.as_str()], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Update an entry. Returns the updated row, or `None` if not owned.
    pub fn update(
        conn: &Connection,
        id: &EntryId,
        owner: &OwnerId,
        changes: &EntryChanges,
    ) -> Result<Option<LedgerEntry>> {
        // Build dynamic SET clause
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref desc) = changes.description {
            sets.push("description = ?".to_string());
            values.push(Box::new(desc.clone()));
        }
        if let Some(amount) = changes.amount {
            sets.push("amount_cents = ?".to_string());
            values.push(Box::new(amount.cents()));
        }
        if let Some(ref cid) = changes.category_id {
            sets.push("category_id = ?".to_string());
            values.push(Box::new(cid.as_str().to_string()));
        }
        if let Some(kind) = changes.kind {
            sets.push("kind = ?".to_string());
            values.push(Box::new(kind.as_sql().to_string()));
        }
        if let Some(due) = changes.due_date {
            sets.push("due_date = ?".to_string());
            values.push(Box::new(date_to_sql(due)));
        }
        if let Some(payment) = changes.payment_date {
            sets.push("payment_date = ?".to_string());
            values.push(Box::new(date_to_sql(payment)));
        }
        if let Some(paid) = changes.paid {
            sets.push("paid = ?".to_string());
            values.push(Box::new(paid));
        }
        if let Some(ref note) = changes.note {
            sets.push("note = ?".to_string());
            values.push(Box::new(note.clone()));
        }

        if !sets.is_empty() {
            sets.push("updated_at = ?".to_string());
            values.push(Box::new(now_iso()));

            let sql = format!(
                "UPDATE ledger_entries SET {} WHERE id = ? AND owner_id = ?",
                sets.join(", ")
            );
            values.push(Box::new(id.as_str().to_string()));
            values.push(Box::new(owner.as_str().to_string()));
            let params_refs: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(AsRef::as_ref).collect();
            let _ = conn.execute(&sql, params_refs.as_slice())?;
        }

        Self::get(conn, id, owner)
    }

    /// Delete an entry. The embedding row cascades in the same statement.
    pub fn delete(conn: &Connection, id: &EntryId, owner: &OwnerId) -> Result<bool> {
        let affected = conn.execute(
            "DELETE FROM ledger_entries WHERE id = ?1 AND owner_id = ?2",
            params![id.as_str(), owner.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// All siblings of an installment group, earliest due date first.
    pub fn group_members(
        conn: &Connection,
        group: &GroupId,
        owner: &OwnerId,
    ) -> Result<Vec<LedgerEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries \
             WHERE installment_group_id = ?1 AND owner_id = ?2 \
             ORDER BY due_date ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![group.as_str(), owner.as_str()], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Apply changes to every sibling of a group in one transaction.
    ///
    /// Sibling due/payment dates are untouched ([`GroupChanges`] cannot carry
    /// them). A changed description is rewritten per-row with the sibling's
    /// 1-based position so "(i/N)" ordinals stay consistent. Returns the
    /// affected entry IDs (empty when the group is absent or foreign).
    pub fn update_group(
        conn: &mut Connection,
        group: &GroupId,
        owner: &OwnerId,
        changes: &GroupChanges,
    ) -> Result<Vec<EntryId>> {
        let tx = conn.transaction()?;
        let members = Self::group_members(&tx, group, owner)?;
        if members.is_empty() || changes.is_empty() {
            tx.commit()?;
            return Ok(members.into_iter().map(|m| m.id).collect());
        }

        let total = members.len();
        let now = now_iso();
        for (index, member) in members.iter().enumerate() {
            let mut sets: Vec<String> = Vec::new();
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(ref base) = changes.description {
                let description = if total > 1 {
                    format!("{base} ({}/{total})", index + 1)
                } else {
                    base.clone()
                };
                sets.push("description = ?".to_string());
                values.push(Box::new(description));
            }
            if let Some(amount) = changes.amount {
                sets.push("amount_cents = ?".to_string());
                values.push(Box::new(amount.cents()));
            }
            if let Some(ref cid) = changes.category_id {
                sets.push("category_id = ?".to_string());
                values.push(Box::new(cid.as_str().to_string()));
            }
            if let Some(kind) = changes.kind {
                sets.push("kind = ?".to_string());
                values.push(Box::new(kind.as_sql().to_string()));
            }
            if let Some(paid) = changes.paid {
                sets.push("paid = ?".to_string());
                values.push(Box::new(paid));
            }
            if let Some(ref note) = changes.note {
                sets.push("note = ?".to_string());
                values.push(Box::new(note.clone()));
            }

            sets.push("updated_at = ?".to_string());
            values.push(Box::new(now.clone()));

            let sql = format!(
                "UPDATE ledger_entries SET {} WHERE id = ?",
                sets.join(", ")
            );
            values.push(Box::new(member.id.as_str().to_string()));
            let params_refs: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(AsRef::as_ref).collect();
            let _ = tx.execute(&sql, params_refs.as_slice())?;
        }
        tx.commit()?;

        Ok(members.into_iter().map(|m| m.id).collect())
    }

    /// Delete every sibling of a group in one transaction.
    ///
    /// Embedding rows cascade with their entries. Returns the deleted IDs.
    pub fn delete_group(
        conn: &mut Connection,
        group: &GroupId,
        owner: &OwnerId,
    ) -> Result<Vec<EntryId>> {
        let tx = conn.transaction()?;
        let ids: Vec<EntryId> = Self::group_members(&tx, group, owner)?
            .into_iter()
            .map(|m| m.id)
            .collect();
        let _ = tx.execute(
            "DELETE FROM ledger_entries WHERE installment_group_id = ?1 AND owner_id = ?2",
            params![group.as_str(), owner.as_str()],
        )?;
        tx.commit()?;
        Ok(ids)
    }

    /// Aggregate metrics for an owner's reference month.
    ///
    /// Sums every entry due within the month, paid or not, grouped by kind
    /// and by category.
    pub fn month_metrics(
        conn: &Connection,
        owner: &OwnerId,
        year: i32,
        month: u32,
    ) -> Result<MonthMetrics> {
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| StoreError::InvalidData(format!("invalid month {year}-{month}")))?;
        let first = date_to_sql(first);
        let last = date_to_sql(last);

        let mut income = Amount::ZERO;
        let mut expense = Amount::ZERO;
        {
            let mut stmt = conn.prepare(
                "SELECT kind, COALESCE(SUM(amount_cents), 0) FROM ledger_entries \
                 WHERE owner_id = ?1 AND due_date >= ?2 AND due_date <= ?3 GROUP BY kind",
            )?;
            let rows = stmt.query_map(params![owner.as_str(), first, last], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (kind, cents) = row?;
                match EntryKind::from_sql(&kind) {
                    Some(EntryKind::Income) => income = Amount::from_cents(cents),
                    Some(EntryKind::Expense) => expense = Amount::from_cents(cents),
                    None => {}
                }
            }
        }

        let mut income_by_category = Vec::new();
        let mut expense_by_category = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT c.name, l.kind, SUM(l.amount_cents) AS total FROM ledger_entries l \
                 JOIN categories c ON c.id = l.category_id \
                 WHERE l.owner_id = ?1 AND l.due_date >= ?2 AND l.due_date <= ?3 \
                 GROUP BY c.name, l.kind ORDER BY total DESC",
            )?;
            let rows = stmt.query_map(params![owner.as_str(), first, last], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            for row in rows {
                let (name, kind, cents) = row?;
                let bucket = match EntryKind::from_sql(&kind) {
                    Some(EntryKind::Income) => &mut income_by_category,
                    Some(EntryKind::Expense) => &mut expense_by_category,
                    None => continue,
                };
                bucket.push(CategoryTotal {
                    name,
                    total: Amount::from_cents(cents),
                });
            }
        }

        Ok(MonthMetrics {
            year,
            month,
            income,
            expense,
            income_by_category,
            expense_by_category,
        })
    }

    fn insert(conn: &Connection, id: &EntryId, entry: &NewEntry) -> Result<()> {
        let now = now_iso();
        let _ = conn.execute(
            "INSERT INTO ledger_entries (id, owner_id, category_id, kind, description, \
             amount_cents, due_date, payment_date, paid, note, installment_group_id, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                id.as_str(),
                entry.owner_id.as_str(),
                entry.category_id.as_str(),
                entry.kind.as_sql(),
                entry.description,
                entry.amount.cents(),
                date_to_sql(entry.due_date),
                entry.payment_date.map(date_to_sql),
                entry.paid,
                entry.note,
                entry.installment_group_id.as_ref().map(|g| g.as_str().to_string()),
                now,
            ],
        )?;
        Ok(())
    }
}
