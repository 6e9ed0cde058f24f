//! Stateless SQL repositories.
//!
//! All methods take a `&Connection` (or `&mut Connection` when they open a
//! transaction) and are pure functions that translate between Rust types and
//! SQL. Uses `uuid::Uuid::now_v7()` for time-ordered ID generation.

pub mod categories;
pub mod conversations;
pub mod ledger;

/// Get current UTC timestamp as ISO 8601 string.
pub(crate) fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Serialize a date to its SQL column form.
pub(crate) fn date_to_sql(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a date from its SQL column form.
///
/// The schema only ever stores `%Y-%m-%d`, so the epoch fallback is
/// unreachable on uncorrupted databases.
pub(crate) fn date_from_sql(s: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}
