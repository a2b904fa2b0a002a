//! Transaction domain model

use chrono::NaiveDate;
use serde::Serialize;

/// A transaction tree in the destination's shape
///
/// Split parents carry their legs in `subtransactions` and have no
/// category. Subtransactions use the same type; their `account` is normally
/// empty and they inherit the parent's date and cleared flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Integer minor units, copied from the export unchanged
    pub amount: i64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,
    /// Id of the other leg of a transfer; only used for payee resolution
    #[serde(skip)]
    pub transfer: Option<String>,
    /// Never `Some` with an empty list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtransactions: Option<Vec<Transaction>>,
}

impl Transaction {
    pub fn is_split(&self) -> bool {
        self.subtransactions.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn is_transfer(&self) -> bool {
        self.transfer.is_some()
    }

    /// Subtransactions, treating a missing list as empty
    pub fn splits(&self) -> &[Transaction] {
        self.subtransactions.as_deref().unwrap_or(&[])
    }

    /// Count of this node plus all nested subtransactions
    pub fn node_count(&self) -> usize {
        1 + self.splits().iter().map(Transaction::node_count).sum::<usize>()
    }
}
