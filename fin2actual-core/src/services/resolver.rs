//! Identifier map - provisional ids to destination ids
//!
//! One map exists per import run. It is filled strictly in creation order
//! (accounts, groups, categories, payees) and only read afterwards.

use std::collections::HashMap;

use crate::domain::result::{Error, Result};
use crate::domain::Transaction;

/// Synthetic key the destination's Income category is registered under
pub const INCOME_KEY: &str = "income";

#[derive(Debug, Default, Clone)]
pub struct IdMap {
    entries: HashMap<String, String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the destination id for a provisional id.
    ///
    /// Recording the same pair twice is a no-op; changing an existing entry
    /// is an integrity error.
    pub fn record(&mut self, provisional: &str, real: &str) -> Result<()> {
        match self.entries.get(provisional) {
            Some(existing) if existing == real => Ok(()),
            Some(existing) => Err(Error::integrity(format!(
                "id {} already maps to {}, refusing to remap to {}",
                provisional, existing, real
            ))),
            None => {
                self.entries
                    .insert(provisional.to_string(), real.to_string());
                Ok(())
            }
        }
    }

    /// Destination id for `provisional`, failing if it was never recorded
    pub fn resolve(&self, provisional: &str) -> Result<&str> {
        self.lookup(provisional)
            .ok_or_else(|| Error::not_found(format!("no destination id recorded for {}", provisional)))
    }

    pub fn lookup(&self, provisional: &str) -> Option<&str> {
        self.entries.get(provisional).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite account, category and payee references of a transaction tree.
    ///
    /// Transfer legs keep their payee untouched; it is replaced with the
    /// transfer payee during transfer resolution.
    pub fn rewrite_transaction(&self, tx: &mut Transaction) -> Result<()> {
        if let Some(account) = tx.account.as_mut() {
            *account = self.resolve(account)?.to_string();
        }
        if let Some(category) = tx.category.as_mut() {
            *category = self.resolve(category)?.to_string();
        }
        if tx.transfer.is_none() {
            if let Some(payee) = tx.payee.as_mut() {
                *payee = self.resolve(payee)?.to_string();
            }
        }
        if let Some(subs) = tx.subtransactions.as_mut() {
            for sub in subs.iter_mut() {
                self.rewrite_transaction(sub)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            account: Some("a1".to_string()),
            amount: -100,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            notes: None,
            cleared: false,
            category: Some("c1".to_string()),
            payee: Some("p1".to_string()),
            transfer: None,
            subtransactions: None,
        }
    }

    #[test]
    fn test_resolve_after_record() {
        let mut map = IdMap::new();
        map.record("a1", "dest-a1").unwrap();
        assert_eq!(map.resolve("a1").unwrap(), "dest-a1");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_resolve_before_record_is_not_found() {
        let map = IdMap::new();
        let err = map.resolve("a1").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(map.lookup("a1").is_none());
    }

    #[test]
    fn test_record_is_idempotent_but_not_overwritable() {
        let mut map = IdMap::new();
        map.record("c1", "x").unwrap();
        map.record("c1", "x").unwrap();
        let err = map.record("c1", "y").unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(map.resolve("c1").unwrap(), "x");
    }

    #[test]
    fn test_rewrite_transaction_tree() {
        let mut map = IdMap::new();
        map.record("a1", "A").unwrap();
        map.record("c1", "C").unwrap();
        map.record("c2", "C2").unwrap();
        map.record("p1", "P").unwrap();

        let mut parent = tx("t1");
        parent.category = None;
        let mut leg = tx("s1");
        leg.account = None;
        leg.category = Some("c2".to_string());
        parent.subtransactions = Some(vec![leg]);

        map.rewrite_transaction(&mut parent).unwrap();
        assert_eq!(parent.account.as_deref(), Some("A"));
        assert_eq!(parent.payee.as_deref(), Some("P"));
        let leg = &parent.splits()[0];
        assert_eq!(leg.category.as_deref(), Some("C2"));
        assert!(leg.account.is_none());
    }

    #[test]
    fn test_rewrite_leaves_transfer_payee_alone() {
        let mut map = IdMap::new();
        map.record("a1", "A").unwrap();
        map.record("c1", "C").unwrap();

        let mut leg = tx("t1");
        leg.payee = Some("unregistered".to_string());
        leg.transfer = Some("t2".to_string());
        map.rewrite_transaction(&mut leg).unwrap();
        assert_eq!(leg.payee.as_deref(), Some("unregistered"));
    }

    #[test]
    fn test_rewrite_fails_on_unknown_category() {
        let mut map = IdMap::new();
        map.record("a1", "A").unwrap();
        map.record("p1", "P").unwrap();
        let err = map.rewrite_transaction(&mut tx("t1")).unwrap_err();
        assert!(err.to_string().contains("c1"));
    }
}
