//! Account domain model

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Account type as understood by Actual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Investment,
    Mortgage,
    Other,
}

impl AccountType {
    /// Translate a Financier account type tag.
    ///
    /// ASSET and CASH both land on `other`; anything unlisted is rejected.
    pub fn from_financier(tag: &str) -> Result<Self> {
        match tag {
            "MORTGAGE" => Ok(AccountType::Mortgage),
            "ASSET" => Ok(AccountType::Other),
            "CREDIT" => Ok(AccountType::Credit),
            "DEBIT" => Ok(AccountType::Checking),
            "INVESTMENT" => Ok(AccountType::Investment),
            "SAVINGS" => Ok(AccountType::Savings),
            "CASH" => Ok(AccountType::Other),
            other => Err(Error::mapping(format!("unknown account type '{}'", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Investment => "investment",
            AccountType::Mortgage => "mortgage",
            AccountType::Other => "other",
        }
    }
}

/// An account ready to be created in the destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Provisional id until the destination assigns one
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub closed: bool,
    pub offbudget: bool,
    /// Financier's free-text note
    #[serde(skip)]
    pub note: Option<String>,
    /// Composite Financier `_id` this account came from
    #[serde(skip)]
    pub source_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_table() {
        assert_eq!(AccountType::from_financier("DEBIT").unwrap(), AccountType::Checking);
        assert_eq!(AccountType::from_financier("ASSET").unwrap(), AccountType::Other);
        assert_eq!(AccountType::from_financier("CASH").unwrap(), AccountType::Other);
        assert_eq!(AccountType::from_financier("MORTGAGE").unwrap(), AccountType::Mortgage);
    }

    #[test]
    fn test_unknown_account_type_is_fatal() {
        let err = AccountType::from_financier("CRYPTO").unwrap_err();
        assert!(matches!(err, Error::Mapping(_)));
        assert!(err.to_string().contains("CRYPTO"));
    }

    #[test]
    fn test_account_serializes_for_actual() {
        let account = Account {
            id: "a1".to_string(),
            name: "Checking".to_string(),
            account_type: AccountType::Checking,
            closed: false,
            offbudget: true,
            note: Some("joint".to_string()),
            source_id: "b_1_account_a1".to_string(),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "checking");
        assert_eq!(json["offbudget"], true);
        assert!(json.get("source_id").is_none());
    }
}
