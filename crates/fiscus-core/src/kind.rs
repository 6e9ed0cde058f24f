//! Entry kinds and message roles with their SQL string mappings.

use serde::{Deserialize, Serialize};

/// The two kinds of ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money coming in (salary, refunds, ...).
    Income,
    /// Money going out (bills, purchases, ...).
    Expense,
}

impl EntryKind {
    /// SQL column value for this kind.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parse a SQL column value. Unknown values map to `None`.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Human label in pt-BR, used in canonical embedding text and prompts.
    #[must_use]
    pub fn label_pt(self) -> &'static str {
        match self {
            Self::Income => "RECEITA",
            Self::Expense => "DESPESA",
        }
    }
}

/// Who authored a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human on the other end of the session.
    User,
    /// The assistant.
    Assistant,
}

impl MessageRole {
    /// SQL column value for this role.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a SQL column value. Unknown values map to `None`.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_sql_roundtrip() {
        for kind in [EntryKind::Income, EntryKind::Expense] {
            assert_eq!(EntryKind::from_sql(kind.as_sql()), Some(kind));
        }
    }

    #[test]
    fn kind_unknown_sql_is_none() {
        assert_eq!(EntryKind::from_sql("transfer"), None);
    }

    #[test]
    fn kind_serde_lowercase() {
        let json = serde_json::to_string(&EntryKind::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
        let back: EntryKind = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(back, EntryKind::Income);
    }

    #[test]
    fn role_sql_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            assert_eq!(MessageRole::from_sql(role.as_sql()), Some(role));
        }
    }

    #[test]
    fn labels_pt() {
        assert_eq!(EntryKind::Income.label_pt(), "RECEITA");
        assert_eq!(EntryKind::Expense.label_pt(), "DESPESA");
    }
}
