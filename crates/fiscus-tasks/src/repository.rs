//! SQL data access layer for the job queue.
//!
//! All methods are stateless and take a connection parameter. Claiming runs
//! inside an `IMMEDIATE` transaction so two workers can never claim the same
//! row; completed jobs are deleted; failed claims are released back to
//! `queued` with their attempt count kept.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::errors::Result;
use crate::types::{Job, JobStatus};

/// Get current UTC timestamp as ISO 8601 string.
fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let status: String = row.get(3)?;
    let args: String = row.get(2)?;
    Ok(Job {
        id: row.get(0)?,
        job_type: row.get(1)?,
        args: serde_json::from_str(&args).unwrap_or(serde_json::Value::Null),
        // CHECK constraint guarantees a valid status
        status: JobStatus::from_sql(&status).unwrap_or(JobStatus::Queued),
        attempts: row.get(4)?,
        claimed_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const JOB_COLUMNS: &str = "id, job_type, args, status, attempts, claimed_at, created_at, updated_at";

/// Job repository for SQL queue operations.
pub struct JobRepository;

impl JobRepository {
    /// Insert a new queued job.
    pub fn enqueue(conn: &Connection, job_type: &str, args: &serde_json::Value) -> Result<Job> {
        let id = Uuid::now_v7().to_string();
        let now = now_iso();
        let _ = conn.execute(
            "INSERT INTO jobs (id, job_type, args, status, attempts, created_at, updated_at) \
             VALUES (?1, ?2, ?3, 'queued', 0, ?4, ?4)",
            params![id, job_type, args.to_string(), now],
        )?;
        Self::get(conn, &id)?.ok_or_else(|| {
            rusqlite::Error::QueryReturnedNoRows.into()
        })
    }

    /// Get a job by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Job>> {
        let job = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    /// Claim the next deliverable job, if any.
    ///
    /// Deliverable means `queued`, or `running` with a claim older than
    /// `visibility_timeout_secs` (a worker died mid-job — redeliver).
    /// The claimed job transitions to `running` with a fresh claim timestamp
    /// and an incremented attempt count, all inside one `IMMEDIATE`
    /// transaction.
    pub fn claim_next(
        conn: &mut Connection,
        visibility_timeout_secs: i64,
    ) -> Result<Option<Job>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let cutoff = (Utc::now() - Duration::seconds(visibility_timeout_secs))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let candidate: Option<String> = tx
            .query_row(
                "SELECT id FROM jobs \
                 WHERE status = 'queued' OR (status = 'running' AND claimed_at <= ?1) \
                 ORDER BY created_at ASC, id ASC LIMIT 1",
                params![cutoff],
                |row| row.get(0),
            )
            .optional()?;

        let Some(id) = candidate else {
            tx.commit()?;
            return Ok(None);
        };

        let now = now_iso();
        let _ = tx.execute(
            "UPDATE jobs SET status = 'running', claimed_at = ?1, \
             attempts = attempts + 1, updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        let job = tx
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id],
                job_from_row,
            )
            .optional()?;
        tx.commit()?;
        Ok(job)
    }

    /// Delete a completed job.
    pub fn complete(conn: &Connection, id: &str) -> Result<()> {
        let _ = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Release a failed claim back to `queued` (attempt count kept).
    pub fn release(conn: &Connection, id: &str) -> Result<()> {
        let _ = conn.execute(
            "UPDATE jobs SET status = 'queued', claimed_at = NULL, updated_at = ?1 \
             WHERE id = ?2",
            params![now_iso(), id],
        )?;
        Ok(())
    }

    /// Number of jobs currently in the table (queued + running).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn depth(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row("SELECT count(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiscus_store::migrations::run_migrations;
    use serde_json::json;

    fn open_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn enqueue_inserts_queued_job() {
        let conn = open_db();
        let job = JobRepository::enqueue(&conn, "index_entry", &json!({"entryId": "e1"}))
            .unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.args["entryId"], "e1");
        assert_eq!(JobRepository::depth(&conn).unwrap(), 1);
    }

    #[test]
    fn claim_oldest_first() {
        let mut conn = open_db();
        let first = JobRepository::enqueue(&conn, "index_entry", &json!({"n": 1})).unwrap();
        let _ = JobRepository::enqueue(&conn, "index_entry", &json!({"n": 2})).unwrap();

        let claimed = JobRepository::claim_next(&mut conn, 120).unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.status, JobStatus::Running);
        assert_eq!(claimed.attempts, 1);
        assert!(claimed.claimed_at.is_some());
    }

    #[test]
    fn claimed_job_is_not_reclaimed_within_timeout() {
        let mut conn = open_db();
        let _ = JobRepository::enqueue(&conn, "index_entry", &json!({})).unwrap();
        let _ = JobRepository::claim_next(&mut conn, 120).unwrap().unwrap();
        assert!(JobRepository::claim_next(&mut conn, 120).unwrap().is_none());
    }

    #[test]
    fn stale_claim_is_redelivered() {
        let mut conn = open_db();
        let _ = JobRepository::enqueue(&conn, "index_entry", &json!({})).unwrap();
        let first = JobRepository::claim_next(&mut conn, 120).unwrap().unwrap();

        // Zero timeout: the claim is immediately stale.
        let second = JobRepository::claim_next(&mut conn, 0).unwrap().unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.attempts, 2);
    }

    #[test]
    fn complete_deletes_row() {
        let mut conn = open_db();
        let _ = JobRepository::enqueue(&conn, "index_entry", &json!({})).unwrap();
        let claimed = JobRepository::claim_next(&mut conn, 120).unwrap().unwrap();
        JobRepository::complete(&conn, &claimed.id).unwrap();
        assert_eq!(JobRepository::depth(&conn).unwrap(), 0);
    }

    #[test]
    fn release_requeues_with_attempts_kept() {
        let mut conn = open_db();
        let _ = JobRepository::enqueue(&conn, "index_entry", &json!({})).unwrap();
        let claimed = JobRepository::claim_next(&mut conn, 120).unwrap().unwrap();
        JobRepository::release(&conn, &claimed.id).unwrap();

        let job = JobRepository::get(&conn, &claimed.id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 1);
        assert!(job.claimed_at.is_none());

        // Immediately claimable again
        let again = JobRepository::claim_next(&mut conn, 120).unwrap().unwrap();
        assert_eq!(again.attempts, 2);
    }

    #[test]
    fn claim_empty_queue_is_none() {
        let mut conn = open_db();
        assert!(JobRepository::claim_next(&mut conn, 120).unwrap().is_none());
    }
}
