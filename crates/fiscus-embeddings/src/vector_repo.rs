//! Vector repository with `SQLite` BLOB storage and brute-force KNN search.
//!
//! One row per ledger entry (`entry_id` UNIQUE). Every read and every search
//! is scoped to a single owner — a query vector can never surface another
//! owner's rows.

use rusqlite::{params, Connection, OptionalExtension, Row};

use fiscus_core::{EntryId, OwnerId};

use crate::errors::Result;
use crate::normalize::cosine_distance;

/// Convert an f32 slice to a byte blob for storage.
pub fn f32_slice_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a byte blob back to an f32 vector.
pub fn blob_to_f32_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// A stored embedding row.
#[derive(Clone, Debug)]
pub struct EmbeddingRecord {
    /// Row ID.
    pub id: String,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Source ledger entry (unique per record).
    pub entry_id: EntryId,
    /// Canonical text that was embedded.
    pub content: String,
    /// The stored vector.
    pub vector: Vec<f32>,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// One search result with its distance to the query.
#[derive(Clone, Debug)]
pub struct SearchHit {
    /// The matched record.
    pub record: EmbeddingRecord,
    /// Cosine distance to the query (smaller = more similar).
    pub distance: f32,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<EmbeddingRecord> {
    let blob: Vec<u8> = row.get(4)?;
    let metadata: Option<String> = row.get(5)?;
    Ok(EmbeddingRecord {
        id: row.get(0)?,
        owner_id: row.get::<_, String>(1)?.into(),
        entry_id: EntryId::from_string(row.get(2)?),
        content: row.get(3)?,
        vector: blob_to_f32_vec(&blob),
        metadata: metadata.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(6)?,
    })
}

const RECORD_COLUMNS: &str = "id, owner_id, entry_id, content, embedding, metadata, created_at";

/// Vector repository using regular `SQLite` tables with brute-force KNN.
pub struct VectorRepository;

impl VectorRepository {
    /// Upsert the embedding for an entry.
    ///
    /// Updates the existing row in place if one exists (preserving its row ID
    /// and creation timestamp), inserts otherwise. Keyed by `entry_id`, so
    /// re-running against unchanged entry state stores an equivalent record.
    pub fn upsert(
        conn: &Connection,
        owner: &OwnerId,
        entry: &EntryId,
        content: &str,
        vector: &[f32],
        metadata: Option<&serde_json::Value>,
    ) -> Result<()> {
        let blob = f32_slice_to_blob(vector);
        let metadata_json = metadata.map(ToString::to_string);

        let updated = conn.execute(
            "UPDATE finance_embeddings SET content = ?1, embedding = ?2, metadata = ?3 \
             WHERE entry_id = ?4 AND owner_id = ?5",
            params![content, blob, metadata_json, entry.as_str(), owner.as_str()],
        )?;
        if updated == 0 {
            let id = uuid_v7();
            let now = chrono_now_iso();
            let _ = conn.execute(
                "INSERT INTO finance_embeddings (id, owner_id, entry_id, content, embedding, metadata, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, owner.as_str(), entry.as_str(), content, blob, metadata_json, now],
            )?;
        }
        Ok(())
    }

    /// Get the record for an entry, scoped to its owner.
    pub fn get_by_entry(
        conn: &Connection,
        entry: &EntryId,
        owner: &OwnerId,
    ) -> Result<Option<EmbeddingRecord>> {
        let record = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM finance_embeddings \
                     WHERE entry_id = ?1 AND owner_id = ?2"
                ),
                params![entry.as_str(), owner.as_str()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Delete the record for an entry. No-op when absent.
    pub fn delete_by_entry(conn: &Connection, entry: &EntryId, owner: &OwnerId) -> Result<()> {
        let _ = conn.execute(
            "DELETE FROM finance_embeddings WHERE entry_id = ?1 AND owner_id = ?2",
            params![entry.as_str(), owner.as_str()],
        )?;
        Ok(())
    }

    /// Count an owner's stored vectors.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn count(conn: &Connection, owner: &OwnerId) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM finance_embeddings WHERE owner_id = ?1",
            params![owner.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// K-nearest-neighbor search over one owner's vectors.
    ///
    /// Returns up to `k` hits ordered by ascending cosine distance. An empty
    /// index yields an empty vec. The sort is stable, so ties keep their
    /// load order.
    pub fn search(
        conn: &Connection,
        owner: &OwnerId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM finance_embeddings WHERE owner_id = ?1 \
             ORDER BY created_at ASC, id ASC"
        ))?;
        let records = stmt
            .query_map(params![owner.as_str()], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut hits: Vec<SearchHit> = records
            .into_iter()
            .filter(|r| r.vector.len() == query.len())
            .map(|record| {
                let distance = cosine_distance(query, &record.vector);
                SearchHit { record, distance }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

fn uuid_v7() -> String {
    uuid::Uuid::now_v7().to_string()
}

fn chrono_now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::l2_normalize;
    use fiscus_store::migrations::run_migrations;

    fn open_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        seed_entries(&conn);
        conn
    }

    /// Embedding rows reference ledger entries; seed a handful.
    fn seed_entries(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO categories (id, name, kind, created_at) VALUES ('c1', 'Outros', 'expense', 't');",
        )
        .unwrap();
        for (id, owner) in [
            ("e1", "u1"),
            ("e2", "u1"),
            ("e3", "u1"),
            ("e4", "u2"),
            ("e5", "u2"),
        ] {
            let _ = conn
                .execute(
                    "INSERT INTO ledger_entries (id, owner_id, category_id, kind, description, \
                     amount_cents, due_date, created_at, updated_at) \
                     VALUES (?1, ?2, 'c1', 'expense', 'x', 100, '2025-01-01', 't', 't')",
                    params![id, owner],
                )
                .unwrap();
        }
    }

    fn vector(dims: usize, seed: u8) -> Vec<f32> {
        let mut v: Vec<f32> = (0..dims)
            .map(|i| (i as f32 + f32::from(seed) * 7.3).sin())
            .collect();
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn upsert_inserts_then_updates() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        let entry: EntryId = "e1".into();

        VectorRepository::upsert(&conn, &owner, &entry, "v1", &vector(8, 1), None).unwrap();
        assert_eq!(VectorRepository::count(&conn, &owner).unwrap(), 1);

        VectorRepository::upsert(&conn, &owner, &entry, "v2", &vector(8, 2), None).unwrap();
        assert_eq!(VectorRepository::count(&conn, &owner).unwrap(), 1);

        let record = VectorRepository::get_by_entry(&conn, &entry, &owner)
            .unwrap()
            .unwrap();
        assert_eq!(record.content, "v2");
    }

    #[test]
    fn upsert_identical_state_is_idempotent() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        let entry: EntryId = "e1".into();
        let v = vector(8, 1);

        VectorRepository::upsert(&conn, &owner, &entry, "same", &v, None).unwrap();
        let first = VectorRepository::get_by_entry(&conn, &entry, &owner)
            .unwrap()
            .unwrap();

        VectorRepository::upsert(&conn, &owner, &entry, "same", &v, None).unwrap();
        let second = VectorRepository::get_by_entry(&conn, &entry, &owner)
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.content, second.content);
        assert_eq!(first.vector, second.vector);
        assert_eq!(VectorRepository::count(&conn, &owner).unwrap(), 1);
    }

    #[test]
    fn get_scoped_to_owner() {
        let conn = open_db();
        VectorRepository::upsert(&conn, &"u1".into(), &"e1".into(), "x", &vector(8, 1), None)
            .unwrap();
        assert!(VectorRepository::get_by_entry(&conn, &"e1".into(), &"u2".into())
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_removes_and_is_noop_when_absent() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        VectorRepository::upsert(&conn, &owner, &"e1".into(), "x", &vector(8, 1), None).unwrap();
        VectorRepository::delete_by_entry(&conn, &"e1".into(), &owner).unwrap();
        assert_eq!(VectorRepository::count(&conn, &owner).unwrap(), 0);
        VectorRepository::delete_by_entry(&conn, &"e1".into(), &owner).unwrap();
    }

    #[test]
    fn search_empty_index_is_empty() {
        let conn = open_db();
        let hits =
            VectorRepository::search(&conn, &"u1".into(), &vector(8, 0), 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn search_orders_by_ascending_distance() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        let query = vector(8, 0);

        VectorRepository::upsert(&conn, &owner, &"e1".into(), "exact", &query, None).unwrap();
        VectorRepository::upsert(&conn, &owner, &"e2".into(), "far", &vector(8, 100), None)
            .unwrap();

        let hits = VectorRepository::search(&conn, &owner, &query, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.content, "exact");
        assert!(hits[0].distance < hits[1].distance);
        assert!(hits[0].distance.abs() < 1e-5);
    }

    #[test]
    fn search_respects_k() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        for (i, entry) in ["e1", "e2", "e3"].iter().enumerate() {
            VectorRepository::upsert(
                &conn,
                &owner,
                &(*entry).into(),
                "x",
                &vector(8, i as u8 + 1),
                None,
            )
            .unwrap();
        }
        let hits = VectorRepository::search(&conn, &owner, &vector(8, 0), 2).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_never_crosses_owners() {
        let conn = open_db();
        let query = vector(8, 0);
        // u2's vector is an exact match for the query; u1 must not see it.
        VectorRepository::upsert(&conn, &"u2".into(), &"e4".into(), "theirs", &query, None)
            .unwrap();
        VectorRepository::upsert(&conn, &"u1".into(), &"e1".into(), "mine", &vector(8, 9), None)
            .unwrap();

        let hits = VectorRepository::search(&conn, &"u1".into(), &query, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.content, "mine");
        assert_eq!(hits[0].record.owner_id.as_str(), "u1");
    }

    #[test]
    fn sentinel_vector_ranks_last() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        let query = vector(8, 0);
        VectorRepository::upsert(&conn, &owner, &"e1".into(), "sentinel", &[0.0; 8], None)
            .unwrap();
        VectorRepository::upsert(&conn, &owner, &"e2".into(), "real", &vector(8, 1), None)
            .unwrap();

        let hits = VectorRepository::search(&conn, &owner, &query, 10).unwrap();
        assert_eq!(hits.last().unwrap().record.content, "sentinel");
        assert!((hits.last().unwrap().distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_are_skipped() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        VectorRepository::upsert(&conn, &owner, &"e1".into(), "short", &vector(4, 1), None)
            .unwrap();
        VectorRepository::upsert(&conn, &owner, &"e2".into(), "full", &vector(8, 1), None)
            .unwrap();

        let hits = VectorRepository::search(&conn, &owner, &vector(8, 0), 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.content, "full");
    }

    #[test]
    fn blob_roundtrip() {
        let original = vec![1.0_f32, -2.5, 3.125, 0.0];
        let blob = f32_slice_to_blob(&original);
        let recovered = blob_to_f32_vec(&blob);
        assert_eq!(original, recovered);
    }

    #[test]
    fn metadata_roundtrip() {
        let conn = open_db();
        let owner: OwnerId = "u1".into();
        let metadata = serde_json::json!({"source": "reindex"});
        VectorRepository::upsert(
            &conn,
            &owner,
            &"e1".into(),
            "x",
            &vector(8, 1),
            Some(&metadata),
        )
        .unwrap();
        let record = VectorRepository::get_by_entry(&conn, &"e1".into(), &owner)
            .unwrap()
            .unwrap();
        assert_eq!(record.metadata, Some(metadata));
    }
}
