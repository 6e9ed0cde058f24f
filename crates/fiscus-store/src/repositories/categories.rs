//! Category repository.
//!
//! Categories are either global (`owner_id` NULL, seeded defaults) or
//! per-owner. Auto-created entries resolve their category as: first stored
//! category of the matching kind, else a per-kind fallback created on demand.

use rusqlite::{params, Connection, OptionalExtension, Row};

use fiscus_core::{CategoryId, EntryKind, OwnerId};

use crate::errors::{Result, StoreError};
use crate::repositories::now_iso;
use crate::types::Category;

/// Fallback category name used when an owner has no category of a kind.
pub const FALLBACK_CATEGORY_NAME: &str = "Outros";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let kind: String = row.get(3)?;
    Ok(Category {
        id: CategoryId::from_string(row.get(0)?),
        owner_id: row.get::<_, Option<String>>(1)?.map(OwnerId::from_string),
        name: row.get(2)?,
        // CHECK constraint guarantees a valid kind
        kind: EntryKind::from_sql(&kind).unwrap_or(EntryKind::Expense),
        color: row.get(4)?,
        icon: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const CATEGORY_COLUMNS: &str = "id, owner_id, name, kind, color, icon, created_at";

/// Category repository for SQL CRUD operations.
pub struct CategoryRepository;

impl CategoryRepository {
    /// Create a category.
    pub fn create(
        conn: &Connection,
        owner: Option<&OwnerId>,
        name: &str,
        kind: EntryKind,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category> {
        let id = CategoryId::new();
        let _ = conn.execute(
            "INSERT INTO categories (id, owner_id, name, kind, color, icon, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.as_str(),
                owner.map(|o| o.as_str().to_string()),
                name,
                kind.as_sql(),
                color,
                icon,
                now_iso(),
            ],
        )?;
        Self::get(conn, &id)?
            .ok_or_else(|| StoreError::InvalidData(format!("category {id} vanished after insert")))
    }

    /// Get a category by ID.
    pub fn get(conn: &Connection, id: &CategoryId) -> Result<Option<Category>> {
        let category = conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
                params![id.as_str()],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// List categories of a kind visible to an owner (global + own).
    pub fn list_by_kind(
        conn: &Connection,
        kind: EntryKind,
        owner: &OwnerId,
    ) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE kind = ?1 AND (owner_id IS NULL OR owner_id = ?2) \
             ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![kind.as_sql(), owner.as_str()], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// First category of a kind visible to an owner, in creation order.
    pub fn first_of_kind(
        conn: &Connection,
        kind: EntryKind,
        owner: &OwnerId,
    ) -> Result<Option<Category>> {
        let category = conn
            .query_row(
                &format!(
                    "SELECT {CATEGORY_COLUMNS} FROM categories \
                     WHERE kind = ?1 AND (owner_id IS NULL OR owner_id = ?2) \
                     ORDER BY created_at ASC, id ASC LIMIT 1"
                ),
                params![kind.as_sql(), owner.as_str()],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Resolve the category for an auto-created entry.
    ///
    /// First stored category of the kind, else the per-kind fallback
    /// ("Outros") created on demand for the owner.
    pub fn resolve_for_kind(
        conn: &Connection,
        kind: EntryKind,
        owner: &OwnerId,
    ) -> Result<Category> {
        if let Some(category) = Self::first_of_kind(conn, kind, owner)? {
            return Ok(category);
        }
        Self::create(conn, Some(owner), FALLBACK_CATEGORY_NAME, kind, None, None)
    }

    /// Seed the global default categories. No-op when any category exists.
    ///
    /// Returns how many categories were inserted.
    pub fn seed_defaults(conn: &Connection) -> Result<usize> {
        let existing: i64 =
            conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let defaults: &[(&str, EntryKind, &str)] = &[
            ("Moradia", EntryKind::Expense, "🏠"),
            ("Alimentação", EntryKind::Expense, "🛒"),
            ("Transporte", EntryKind::Expense, "🚗"),
            ("Saúde", EntryKind::Expense, "💊"),
            ("Lazer", EntryKind::Expense, "🎬"),
            ("Educação", EntryKind::Expense, "📚"),
            ("Contas", EntryKind::Expense, "💡"),
            ("Outros", EntryKind::Expense, "💳"),
            ("Salário", EntryKind::Income, "💰"),
            ("Outros", EntryKind::Income, "📈"),
        ];
        for &(name, kind, icon) in defaults {
            let _ = Self::create(conn, None, name, kind, None, Some(icon))?;
        }
        Ok(defaults.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn open_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get() {
        let conn = open_db();
        let created =
            CategoryRepository::create(&conn, None, "Moradia", EntryKind::Expense, Some("#FF0000"), Some("🏠"))
                .unwrap();
        let fetched = CategoryRepository::get(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Moradia");
        assert_eq!(fetched.kind, EntryKind::Expense);
        assert_eq!(fetched.color.as_deref(), Some("#FF0000"));
        assert!(fetched.owner_id.is_none());
    }

    #[test]
    fn list_by_kind_filters() {
        let conn = open_db();
        let _ = CategoryRepository::create(&conn, None, "Moradia", EntryKind::Expense, None, None)
            .unwrap();
        let _ = CategoryRepository::create(&conn, None, "Salário", EntryKind::Income, None, None)
            .unwrap();

        let expenses =
            CategoryRepository::list_by_kind(&conn, EntryKind::Expense, &"u1".into()).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].name, "Moradia");
    }

    #[test]
    fn list_excludes_foreign_owner() {
        let conn = open_db();
        let _ = CategoryRepository::create(
            &conn,
            Some(&"u2".into()),
            "Particular",
            EntryKind::Expense,
            None,
            None,
        )
        .unwrap();

        let visible =
            CategoryRepository::list_by_kind(&conn, EntryKind::Expense, &"u1".into()).unwrap();
        assert!(visible.is_empty());
    }

    #[test]
    fn first_of_kind_creation_order() {
        let conn = open_db();
        let first = CategoryRepository::create(&conn, None, "Primeira", EntryKind::Expense, None, None)
            .unwrap();
        let _ = CategoryRepository::create(&conn, None, "Segunda", EntryKind::Expense, None, None)
            .unwrap();

        let resolved = CategoryRepository::first_of_kind(&conn, EntryKind::Expense, &"u1".into())
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, first.id);
    }

    #[test]
    fn resolve_uses_existing() {
        let conn = open_db();
        let existing =
            CategoryRepository::create(&conn, None, "Moradia", EntryKind::Expense, None, None)
                .unwrap();
        let resolved =
            CategoryRepository::resolve_for_kind(&conn, EntryKind::Expense, &"u1".into()).unwrap();
        assert_eq!(resolved.id, existing.id);
    }

    #[test]
    fn seed_defaults_once() {
        let conn = open_db();
        let inserted = CategoryRepository::seed_defaults(&conn).unwrap();
        assert_eq!(inserted, 10);

        // Idempotent
        assert_eq!(CategoryRepository::seed_defaults(&conn).unwrap(), 0);

        let expenses =
            CategoryRepository::list_by_kind(&conn, EntryKind::Expense, &"u1".into()).unwrap();
        assert_eq!(expenses.len(), 8);
        assert!(expenses.iter().all(|c| c.owner_id.is_none()));
    }

    #[test]
    fn resolve_creates_fallback() {
        let conn = open_db();
        let resolved =
            CategoryRepository::resolve_for_kind(&conn, EntryKind::Income, &"u1".into()).unwrap();
        assert_eq!(resolved.name, FALLBACK_CATEGORY_NAME);
        assert_eq!(resolved.kind, EntryKind::Income);
        assert_eq!(resolved.owner_id.as_deref(), Some("u1"));

        // Second resolve reuses the fallback
        let again =
            CategoryRepository::resolve_for_kind(&conn, EntryKind::Income, &"u1".into()).unwrap();
        assert_eq!(again.id, resolved.id);
    }
}
