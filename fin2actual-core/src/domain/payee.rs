//! Payees

use serde::{Deserialize, Serialize};

/// A payee ready to be created in the destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payee {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub source_id: String,
}

/// A payee as listed back by the destination
///
/// Actual creates one payee per account to stand for transfers into that
/// account; `transfer_acct` names the account for those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationPayee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transfer_acct: Option<String>,
}

impl DestinationPayee {
    pub fn is_transfer_payee_for(&self, account_id: &str) -> bool {
        self.transfer_acct.as_deref() == Some(account_id)
    }
}
