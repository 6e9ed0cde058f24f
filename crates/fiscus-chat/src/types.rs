//! Pipeline types: intents, month references, exchange events.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use fiscus_core::{Amount, EntryId, EntryKind};

/// The reference month an exchange resolves relative dates against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthRef {
    /// Calendar year.
    pub year: i32,
    /// Month 1-12.
    pub month: u32,
}

impl MonthRef {
    /// The current month in UTC.
    #[must_use]
    pub fn current() -> Self {
        let today = chrono::Utc::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// First day of the reference month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_default()
    }
}

/// A validated "create a ledger entry" intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreationIntent {
    /// Entry description, without ordinal suffix.
    pub name: String,
    /// Per-installment amount.
    pub amount: Amount,
    /// Due date of the first installment.
    pub start_date: NaiveDate,
    /// Number of consecutive monthly installments (>= 1).
    pub installment_count: u32,
    /// Income or expense.
    pub kind: EntryKind,
}

/// Outcome of intent classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Answer from the ledger (default on any extraction miss).
    Query,
    /// Create ledger entries.
    Create(CreationIntent),
}

/// One cited source returned with a query answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCitation {
    /// The cited ledger entry.
    pub entry_id: EntryId,
    /// Canonical text of the entry at indexing time.
    pub content: String,
    /// dd/mm/yyyy registration date.
    pub registered_at: String,
}

/// Events emitted while processing one exchange.
///
/// The session controller relays these to the client as wire frames.
/// Exactly one [`ExchangeEvent::Done`] ends every exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeEvent {
    /// Progress note shown while the pipeline works.
    Status(String),
    /// One generated text fragment.
    Token(String),
    /// Cited sources for the streamed answer.
    Sources(Vec<SourceCitation>),
    /// Terminal event of the exchange.
    Done,
}
