//! Row types and mutation parameter structs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fiscus_core::{Amount, CategoryId, ConversationId, EntryId, EntryKind, GroupId, MessageId, MessageRole, OwnerId};

/// A persisted ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: EntryId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Category.
    pub category_id: CategoryId,
    /// Income or expense.
    pub kind: EntryKind,
    /// Human description; installment siblings carry an "(i/N)" suffix.
    pub description: String,
    /// Fixed-point amount.
    pub amount: Amount,
    /// Due date.
    pub due_date: NaiveDate,
    /// Settlement date, if paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    /// Whether the entry is settled.
    pub paid: bool,
    /// Free-form note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Links siblings created in one installment batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_group_id: Option<GroupId>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

/// Parameters for creating a ledger entry.
#[derive(Clone, Debug)]
pub struct NewEntry {
    /// Owning user.
    pub owner_id: OwnerId,
    /// Category.
    pub category_id: CategoryId,
    /// Income or expense.
    pub kind: EntryKind,
    /// Human description.
    pub description: String,
    /// Fixed-point amount.
    pub amount: Amount,
    /// Due date.
    pub due_date: NaiveDate,
    /// Settlement date, if already paid.
    pub payment_date: Option<NaiveDate>,
    /// Whether the entry is settled.
    pub paid: bool,
    /// Free-form note.
    pub note: Option<String>,
    /// Installment batch link.
    pub installment_group_id: Option<GroupId>,
}

/// Field changes for a single-entry update. `None` leaves the field as-is.
#[derive(Clone, Debug, Default)]
pub struct EntryChanges {
    /// New description.
    pub description: Option<String>,
    /// New amount.
    pub amount: Option<Amount>,
    /// New category.
    pub category_id: Option<CategoryId>,
    /// New kind.
    pub kind: Option<EntryKind>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New payment date.
    pub payment_date: Option<NaiveDate>,
    /// New paid flag.
    pub paid: Option<bool>,
    /// New note.
    pub note: Option<String>,
}

/// Field changes applied to every sibling of an installment group.
///
/// Due and payment dates are structurally absent: group updates never move
/// sibling dates onto each other. A changed description is re-suffixed with
/// each sibling's stored "(i/N)" ordinal.
#[derive(Clone, Debug, Default)]
pub struct GroupChanges {
    /// New base description (without ordinal suffix).
    pub description: Option<String>,
    /// New amount for every sibling.
    pub amount: Option<Amount>,
    /// New category for every sibling.
    pub category_id: Option<CategoryId>,
    /// New kind for every sibling.
    pub kind: Option<EntryKind>,
    /// New paid flag for every sibling.
    pub paid: Option<bool>,
    /// New note for every sibling.
    pub note: Option<String>,
}

impl GroupChanges {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.category_id.is_none()
            && self.kind.is_none()
            && self.paid.is_none()
            && self.note.is_none()
    }
}

/// A spending/earning category.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Owning user; `None` for global defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    /// Display name.
    pub name: String,
    /// Which entry kind this category applies to.
    pub kind: EntryKind,
    /// Optional hex color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional emoji icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// A conversation owning an ordered sequence of messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation ID.
    pub id: ConversationId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Title.
    pub title: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-activity timestamp.
    pub updated_at: String,
}

/// A persisted chat message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID.
    pub id: MessageId,
    /// Conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// Author role.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
    /// Cited sources (JSON array), assistant messages only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<serde_json::Value>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// Per-category total for one month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    /// Category display name.
    pub name: String,
    /// Summed amount.
    pub total: Amount,
}

/// Aggregate metrics for one owner and reference month.
///
/// Sums cover every entry due in the month regardless of paid state — the
/// figures are billed/projected, not cash-settled.
#[derive(Clone, Debug)]
pub struct MonthMetrics {
    /// Reference year.
    pub year: i32,
    /// Reference month (1-12).
    pub month: u32,
    /// Total income due in the month.
    pub income: Amount,
    /// Total expense due in the month.
    pub expense: Amount,
    /// Income per category, largest first.
    pub income_by_category: Vec<CategoryTotal>,
    /// Expense per category, largest first.
    pub expense_by_category: Vec<CategoryTotal>,
}

impl MonthMetrics {
    /// Net balance (income minus expense).
    #[must_use]
    pub fn balance(&self) -> Amount {
        self.income.saturating_sub(self.expense)
    }
}
