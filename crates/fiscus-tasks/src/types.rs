//! Job types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a queued job.
///
/// Completed jobs are deleted rather than kept, so only two states exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a worker.
    Queued,
    /// Claimed by a worker; redelivered if the claim goes stale.
    Running,
}

impl JobStatus {
    /// SQL column value for this status.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
        }
    }

    /// Parse a SQL column value. Unknown values map to `None`.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            _ => None,
        }
    }
}

/// A persisted background job.
#[derive(Clone, Debug)]
pub struct Job {
    /// Job ID (UUID v7).
    pub id: String,
    /// Handler key, e.g. `"index_entry"`.
    pub job_type: String,
    /// Handler arguments (JSON).
    pub args: serde_json::Value,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Delivery attempts so far.
    pub attempts: i64,
    /// When the current claim was taken, if running.
    pub claimed_at: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-transition timestamp.
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_sql_roundtrip() {
        for status in [JobStatus::Queued, JobStatus::Running] {
            assert_eq!(JobStatus::from_sql(status.as_sql()), Some(status));
        }
        assert_eq!(JobStatus::from_sql("done"), None);
    }
}
